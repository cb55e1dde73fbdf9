// Prompt text for the three model calls. Kept together so the wording of the
// site description stays consistent between stages.

use super::pipeline_models::Finding;

pub const RECOGNITION_SYSTEM_PROMPT: &str = "You are analyzing drone photography of an archaeological discovery site.
You need to identify specific artifacts that are visible in the images.

The site contains these artifacts:
1. Stone drawings/carvings - created to simulate ancient earth materials and markings
2. Brass pot with lid - a complete brass vessel
3. A sword - an ancient weapon
4. Coins - including real modern coins (Penny, Dime) and drawings of ancient coins with suggested manufacturing years
5. Bone - skeletal remains

Be factual and specific about what you observe.";

pub const RECOGNITION_USER_PROMPT: &str = "Look at this drone photograph and tell me what artifacts you can see.

Look for:
- Stone drawings or carvings
- A brass pot with lid
- A sword
- Coins (modern Penny, Dime, or ancient coin drawings - suggest years if visible)
- Bone

Describe what you see factually - what's there, where things are, what condition they're in.
Only mention what you can clearly see. Don't make things up.";

pub const RECOGNITION_MAX_TOKENS: u32 = 500;

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You turn field notes from an archaeological drone survey into a structured artifact list.
Respond with JSON only. Use this exact shape:
{\"artifacts\": [{\"name\": \"...\", \"time_period\": \"...\", \"country_of_origin\": \"...\", \"additional_info\": \"...\"}]}
Give your best estimate for time_period and country_of_origin, and say \"Unknown\" when there is nothing to go on.
List each distinct artifact once.";

pub const EXTRACTION_MAX_TOKENS: u32 = 1000;

pub const NARRATION_SYSTEM_PROMPT: &str = "You are creating a presentation script for a 7th grade girl to read to teachers and judges in an FLL innovation project.
The narration should be approximately 30 to 40 seconds when spoken at a normal, clear pace.

Write like how a real 7th grade girl would present to teachers - clear, confident, and natural.
It should sound like a student presentation: organized, easy to understand, but still age-appropriate.
Use simple words that a 7th grader would use. Sound confident and informative, like presenting a school project.
Don't use fancy words or poetic language. Be clear and straightforward.
Keep sentences short and easy to understand. Sound enthusiastic about the project but professional.";

pub const NARRATION_MAX_TOKENS: u32 = 500;

/// Findings numbered from 1, one per line: `Drone Photo 1: ...`.
pub fn numbered_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .enumerate()
        .map(|(i, f)| format!("Drone Photo {}: {}", i + 1, f.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn extraction_user_prompt(findings: &[Finding]) -> String {
    format!(
        "Here are the observations from each drone photo:\n\n{}\n\n\
         List every artifact mentioned, with its name, estimated time period, \
         estimated country of origin, and any additional details from the observations.",
        numbered_findings(findings)
    )
}

pub fn narration_user_prompt(findings: &[Finding]) -> String {
    format!(
        "Based on these drone photograph analyses, write a presentation script (30-40 seconds when spoken) that sounds like a 7th grade girl presenting to teachers:

{}

The artifacts found are:
- Stone drawings/carvings
- A brass pot with lid
- A sword
- Coins: modern coins (Penny, Dime) and ancient coin drawings (with years if mentioned)
- Bone

Write the narration so it:
1. Opens clearly - \"Hi, I'm going to tell you about our archaeological discovery...\"
2. Describes what the drone found in an organized way - talk about each artifact clearly
3. Explains what these artifacts tell us - connects them together in a simple, educational way
4. Ends with a clear conclusion about what we learned

Use the details from the analyses but explain them clearly for an audience.
If coins have dates mentioned, include them naturally in your explanation.
Keep it between 30-40 seconds when read at a normal pace.",
        numbered_findings(findings)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_findings_are_numbered_from_one() {
        let findings = vec![Finding::new("a sword"), Finding::new("two coins")];
        assert_eq!(
            numbered_findings(&findings),
            "Drone Photo 1: a sword\nDrone Photo 2: two coins"
        );
    }

    #[test]
    fn test_narration_prompt_embeds_every_finding() {
        let findings = vec![Finding::new("a brass pot"), Finding::new("a bone")];
        let prompt = narration_user_prompt(&findings);
        assert!(prompt.contains("Drone Photo 1: a brass pot"));
        assert!(prompt.contains("Drone Photo 2: a bone"));
        assert!(prompt.contains("30-40 seconds"));
    }
}
