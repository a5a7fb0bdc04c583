//! Built-in demo personas for the admin seed operation.
//!
//! Two realistic profiles so a fresh install has something to browse, chat
//! with, and panel before any contributor finishes an interview.

use lens_common::{
    ConfidenceScores, Demographics, PersonaAttributes, PersonaProfile, TasteSignals,
};

pub fn demo_personas() -> Vec<PersonaProfile> {
    vec![sarah(), marcus()]
}

fn sarah() -> PersonaProfile {
    let attributes = PersonaAttributes {
        display_name: Some("Conscious-Consumer UX Designer".to_string()),
        demographics: Some(Demographics {
            age_range: Some("30-34".to_string()),
            location_type: Some("urban".to_string()),
            life_stage: Some("young professional".to_string()),
            household: Some("partnered, no kids".to_string()),
        }),
        values: vec![
            "sustainability".to_string(),
            "transparency".to_string(),
            "intentional living".to_string(),
            "community".to_string(),
            "quality over quantity".to_string(),
        ],
        behavioral_patterns: vec![
            "thorough researcher before purchases".to_string(),
            "brand loyal once trust is earned".to_string(),
            "willing to pay premium for ethics".to_string(),
            "skeptical of marketing claims".to_string(),
        ],
        interests: vec![
            "sustainable design".to_string(),
            "native gardening".to_string(),
            "accessible technology".to_string(),
            "outdoor activities".to_string(),
        ],
        life_context: vec![
            "remote worker".to_string(),
            "considering parenthood".to_string(),
            "career transition planned".to_string(),
            "partner and rescue dog".to_string(),
        ],
        decision_style: Some("analytical".to_string()),
        communication_style: Some("warm".to_string()),
        taste_signals: Some(TasteSignals {
            brands_mentioned: vec![
                "Patagonia".to_string(),
                "Aesop".to_string(),
                "Notion".to_string(),
            ],
            preferences: vec![
                "ethical sourcing".to_string(),
                "repair programs".to_string(),
                "transparent supply chains".to_string(),
            ],
            dislikes: vec![
                "greenwashing".to_string(),
                "unnecessary subscriptions".to_string(),
                "fake influencer marketing".to_string(),
            ],
        }),
        ..Default::default()
    };

    PersonaProfile::new(
        None,
        "Sarah is a 32-year-old UX designer in Portland who values sustainability, \
         transparency, and intentional living. Raised by teacher parents who prioritized \
         experiences over material goods, she carries a thoughtful, research-driven approach \
         to every purchase. She's willing to pay premium prices for brands that demonstrate \
         genuine environmental commitment, but has zero tolerance for greenwashing.\n\n\
         Her life revolves around meaningful work, nature, and community. She volunteers \
         teaching digital skills to seniors, maintains a native plant garden, and works \
         remotely for a tech company. She's at a crossroads thinking about starting a family \
         and launching her own sustainable design consultancy."
            .to_string(),
        attributes,
        ConfidenceScores {
            demographics: 0.95,
            values: 0.9,
            behavioral: 0.85,
            interests: 0.8,
            life_context: 0.9,
            overall: 0.88,
        },
        true,
    )
}

fn marcus() -> PersonaProfile {
    let attributes = PersonaAttributes {
        display_name: Some("Results-Driven Business Owner".to_string()),
        demographics: Some(Demographics {
            age_range: Some("45-49".to_string()),
            location_type: Some("suburban".to_string()),
            life_stage: Some("established professional".to_string()),
            household: Some("married with children".to_string()),
        }),
        values: vec![
            "hard work".to_string(),
            "family".to_string(),
            "community".to_string(),
            "practical results".to_string(),
            "financial prudence".to_string(),
        ],
        behavioral_patterns: vec![
            "ROI-driven business decisions".to_string(),
            "brand loyal for personal purchases".to_string(),
            "time-constrained shopper".to_string(),
            "values word-of-mouth recommendations".to_string(),
        ],
        interests: vec![
            "fitness/running".to_string(),
            "basketball coaching".to_string(),
            "mentoring entrepreneurs".to_string(),
            "business growth".to_string(),
        ],
        life_context: vec![
            "small business owner".to_string(),
            "father of two".to_string(),
            "first-generation college graduate".to_string(),
            "community mentor".to_string(),
        ],
        decision_style: Some("practical".to_string()),
        communication_style: Some("direct".to_string()),
        taste_signals: Some(TasteSignals {
            brands_mentioned: vec![
                "Amazon Business".to_string(),
                "Nike".to_string(),
                "QuickBooks".to_string(),
                "Ford".to_string(),
            ],
            preferences: vec![
                "reliable products".to_string(),
                "good customer service".to_string(),
                "all-in-one solutions".to_string(),
            ],
            dislikes: vec![
                "political brand messaging".to_string(),
                "automated customer service".to_string(),
                "overcomplicated tools".to_string(),
            ],
        }),
        ..Default::default()
    };

    PersonaProfile::new(
        None,
        "Marcus is a 45-year-old small business owner in suburban Atlanta who embodies \
         practical, results-driven decision-making shaped by a working-class upbringing in \
         Detroit. As the first college graduate in his family, he carries both the pride of \
         that achievement and the financial prudence his parents instilled. He runs a \
         30-person logistics company and evaluates every business purchase on hard ROI.\n\n\
         Family and community are his anchors. He coaches his son's basketball team, mentors \
         young entrepreneurs, and is deeply brand-loyal once trust is established — he values \
         reliability, straightforward communication, and products that just work."
            .to_string(),
        attributes,
        ConfidenceScores {
            demographics: 0.95,
            values: 0.9,
            behavioral: 0.85,
            interests: 0.8,
            life_context: 0.85,
            overall: 0.87,
        },
        true,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_personas_are_published_and_named() {
        let personas = demo_personas();
        assert_eq!(personas.len(), 2);
        for p in &personas {
            assert!(p.published);
            assert!(p.attributes.display_name.is_some());
            assert!(p.confidence.overall > 0.8);
            assert_eq!(p.version, 1);
        }
    }
}
