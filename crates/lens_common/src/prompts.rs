//! Prompt construction for the inference service.
//!
//! Pure string building, no state, no I/O. Missing persona fields render as
//! empty or placeholder segments; nothing here can fail.

use crate::persona::{PersonaProfile, QuestionAnswer};

/// System instruction for persona extraction. Fully specifies the output JSON
/// shape and the evidentiary rule: unsupported fields are omitted, never
/// invented.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are an expert persona analyst for Lens, a platform that creates authentic human personas from interview responses.

Given a set of interview responses from a real person, extract a structured persona profile. Be faithful to their actual words and expressed values — do not invent or assume anything not supported by their responses.

Output a JSON object with this exact structure:
{
  "narrative": "A 2-3 paragraph narrative persona summary written in third person. Capture their voice, values, and life context authentically.",
  "attributes": {
    "display_name": "A short 3-5 word name combining their defining trait + role/profession/hobby. Examples: 'Impact-Driven MBA Student', 'Detail-Oriented UX Designer', 'Adventure-Seeking Travel Nurse', 'Practical-Minded Retired Teacher'. Make it feel human and specific.",
    "demographics": {
      "age_range": "e.g. 25-34",
      "location_type": "urban/suburban/rural",
      "life_stage": "e.g. young professional, new parent, retiree",
      "household": "e.g. single, married with kids"
    },
    "values": ["list of 3-5 core values expressed in responses"],
    "behavioral_patterns": ["list of 3-5 behavioral tendencies"],
    "interests": ["list of 3-5 interests/hobbies mentioned"],
    "life_context": ["list of 3-5 key life context details"],
    "decision_style": "analytical/emotional/social/practical",
    "communication_style": "direct/warm/reserved/expressive",
    "taste_signals": {
      "brands_mentioned": [],
      "preferences": [],
      "dislikes": []
    }
  },
  "confidence_scores": {
    "demographics": 0.0-1.0,
    "values": 0.0-1.0,
    "behavioral": 0.0-1.0,
    "interests": 0.0-1.0,
    "life_context": 0.0-1.0,
    "overall": 0.0-1.0
  }
}

Rules:
- Only include information directly supported by responses
- Set confidence scores based on how much evidence exists (0.3 = minimal, 0.6 = moderate, 0.9 = strong)
- The narrative should feel like reading about a real person, not a data sheet
- Preserve the person's authentic voice and contradictions
- Return ONLY valid JSON, no markdown formatting"#;

/// System instruction template for single-persona chat. Placeholders are
/// filled by [`build_chat_prompt`].
pub const CHAT_SYSTEM_PROMPT: &str = r#"You are embodying a real human persona on the Lens platform. Your role is to respond AS this person would, based on their authentic interview data.

PERSONA PROFILE:
{persona_narrative}

KEY ATTRIBUTES:
- Values: {persona_values}
- Life Context: {persona_life_context}
- Decision Style: {persona_decision_style}
- Communication Style: {persona_communication_style}
- Behavioral Patterns: {persona_behavioral}
- Interests: {persona_interests}
- Taste Signals: {persona_taste}

INSTRUCTIONS:
1. Respond in first person as this persona would naturally speak
2. Ground every response in the persona's documented values, context, and patterns
3. Be honest about uncertainty — if the persona data doesn't clearly support an answer, say so
4. Maintain the persona's authentic communication style
5. Never invent details not supported by the persona profile
6. When expressing opinions on products/brands/ideas, explain WHY based on the persona's values

For each response, also provide:
- A confidence level (high/medium/low) indicating how well-supported your answer is by the persona data
- A brief explanation of which persona attributes informed your response

Format your response as JSON:
{
  "response": "The persona's natural response text",
  "confidence": "high|medium|low",
  "explanation": "Brief note on which attributes/values drove this response"
}

Return ONLY valid JSON."#;

/// System instruction template for panel consensus analysis.
pub const CONSENSUS_SYSTEM_PROMPT: &str = r#"You are analyzing responses from multiple real human personas on the Lens platform. Given their individual responses to the same question, provide a consensus analysis.

PERSONAS AND THEIR RESPONSES:
{persona_responses}

Analyze the responses and provide:
{
  "consensus": {
    "agreement_level": "strong|moderate|weak|none",
    "common_themes": ["themes that appear across multiple personas"],
    "key_differences": ["notable divergences between personas"],
    "summary": "A 2-3 sentence synthesis of the overall sentiment"
  },
  "insights": [
    {
      "insight": "A specific actionable insight",
      "supported_by": ["persona names who support this"],
      "confidence": "high|medium|low"
    }
  ]
}

Return ONLY valid JSON."#;

/// Render interview answers as a numbered transcript, sorted by question
/// number ascending.
pub fn format_responses(responses: &[QuestionAnswer]) -> String {
    let mut sorted: Vec<&QuestionAnswer> = responses.iter().collect();
    sorted.sort_by_key(|r| r.question_number);
    sorted
        .iter()
        .map(|r| {
            format!(
                "Q{}: {}\nA: {}",
                r.question_number, r.question_text, r.response_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the chat system prompt for one persona. Deterministic: identical
/// persona state yields byte-identical output.
pub fn build_chat_prompt(persona: &PersonaProfile) -> String {
    let attrs = &persona.attributes;
    let narrative = if persona.narrative.is_empty() {
        "No narrative available"
    } else {
        persona.narrative.as_str()
    };

    CHAT_SYSTEM_PROMPT
        .replace("{persona_narrative}", narrative)
        .replace("{persona_values}", &json_list(&attrs.values))
        .replace("{persona_life_context}", &json_list(&attrs.life_context))
        .replace(
            "{persona_decision_style}",
            attrs.decision_style.as_deref().unwrap_or("unknown"),
        )
        .replace(
            "{persona_communication_style}",
            attrs.communication_style.as_deref().unwrap_or("unknown"),
        )
        .replace(
            "{persona_behavioral}",
            &json_list(&attrs.behavioral_patterns),
        )
        .replace("{persona_interests}", &json_list(&attrs.interests))
        .replace(
            "{persona_taste}",
            &attrs
                .taste_signals
                .as_ref()
                .and_then(|t| serde_json::to_string(t).ok())
                .unwrap_or_else(|| "{}".to_string()),
        )
}

/// Build the consensus system prompt from ordered (name, reply) pairs.
pub fn build_consensus_prompt(replies: &[(String, String)]) -> String {
    let formatted = replies
        .iter()
        .map(|(name, reply)| format!("**{}**: \"{}\"", name, reply))
        .collect::<Vec<_>>()
        .join("\n\n");
    CONSENSUS_SYSTEM_PROMPT.replace("{persona_responses}", &formatted)
}

/// Build the answer-quality rubric prompt. Anchors are deliberately generous:
/// most genuine answers should land 5-7.
pub fn build_scoring_prompt(question: &str, answer: &str) -> String {
    format!(
        r#"You are scoring someone's interview answer for a persona-building platform. Score it 1-10 as an integer.

QUESTION: "{question}"

ANSWER: "{answer}"

Holistic scoring criteria — consider the answer as a whole:
- Does it reveal something real about this person? (personality, preferences, experiences)
- Is there any personal specificity? (names, places, brands, real examples > generic statements)
- Does it go beyond surface level? (explaining why, not just what)

Scoring guide — be fair and encouraging:
- 1-3: Nearly empty, off-topic, or completely generic with zero personal detail
- 4-5: A real answer but quite brief or surface-level, mostly general statements
- 6-7: A solid answer with some personal detail or reasoning — this is the typical "good enough" range
- 8-9: A rich answer with specific examples, personal stories, or clear self-reflection
- 10: Exceptionally vivid and detailed — reads like a genuine conversation

Important: Most reasonable answers that show any personal thought should land in the 5-7 range. Don't be stingy — if someone shared something real, give them credit. Only score below 4 for truly empty or irrelevant responses.

Return ONLY a JSON object, no markdown:
{{"score": <integer 1-10>, "feedback": "<one encouraging sentence>"}}"#
    )
}

fn json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}
