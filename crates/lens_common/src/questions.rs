//! Interview question catalogue.
//!
//! Nine questions walked in order: Ground -> Open -> Connect -> Project ->
//! Celebrate. Question numbers are 1-based; API callers index 0-based.

/// Maximum length of a stored interview answer.
pub const MAX_RESPONSE_CHARS: usize = 5000;

/// Maximum length of a chat message to a persona.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Interview phase a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ground,
    Open,
    Connect,
    Project,
    Celebrate,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Ground => "Ground",
            Phase::Open => "Open",
            Phase::Connect => "Connect",
            Phase::Project => "Project",
            Phase::Celebrate => "Celebrate",
        }
    }
}

/// One catalogue entry.
#[derive(Debug, Clone, Copy)]
pub struct InterviewQuestion {
    pub number: u32,
    pub phase: Phase,
    pub question: &'static str,
    pub hint: &'static str,
}

pub const INTERVIEW_QUESTIONS: &[InterviewQuestion] = &[
    InterviewQuestion {
        number: 1,
        phase: Phase::Ground,
        question: "Tell us a little about yourself — what do you do, and what does a typical week look like for you?",
        hint: "Your routine, your work, your rhythm.",
    },
    InterviewQuestion {
        number: 2,
        phase: Phase::Open,
        question: "What's been taking up most of your time and energy lately — whether it's something exciting, stressful, or just all-consuming?",
        hint: "Exciting, stressful, mundane — it all counts.",
    },
    InterviewQuestion {
        number: 3,
        phase: Phase::Open,
        question: "What matters most to you when you think about how you want to live your life? What principles or values do you find yourself coming back to?",
        hint: "Think big or small — what guides your decisions?",
    },
    InterviewQuestion {
        number: 4,
        phase: Phase::Connect,
        question: "When you're not working, what do you genuinely enjoy spending your time and money on?",
        hint: "The 'and money' part matters — what do you actually invest in?",
    },
    InterviewQuestion {
        number: 5,
        phase: Phase::Connect,
        question: "Think about the last purchase you were really happy with — what was it, and what made it feel like the right choice?",
        hint: "A specific story tells us more than a general preference.",
    },
    InterviewQuestion {
        number: 6,
        phase: Phase::Connect,
        question: "Is there something you believe in or care about that actually influences the choices you make — what you buy, where you spend, who you support?",
        hint: "If 'not really,' that's equally valuable.",
    },
    InterviewQuestion {
        number: 7,
        phase: Phase::Project,
        question: "How do you usually discover new products or brands you end up loving? And when you're deciding between two similar options, what usually tips the scales?",
        hint: "Friends, algorithms, reviews, gut feeling?",
    },
    InterviewQuestion {
        number: 8,
        phase: Phase::Project,
        question: "What's something you've been meaning to buy, try, or change in your life but haven't gotten around to yet?",
        hint: "The gap between intention and action is interesting.",
    },
    InterviewQuestion {
        number: 9,
        phase: Phase::Celebrate,
        question: "If a close friend asked you to recommend one thing — a product, a place, an experience, anything — what would you be most excited to tell them about right now?",
        hint: "What you recommend reveals what you truly love.",
    },
];

/// Look up a question by 0-based index.
pub fn question_by_index(index: usize) -> Option<&'static InterviewQuestion> {
    INTERVIEW_QUESTIONS.get(index)
}

/// Look up a question by its 1-based number.
pub fn question_by_number(number: u32) -> Option<&'static InterviewQuestion> {
    INTERVIEW_QUESTIONS.iter().find(|q| q.number == number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_is_nine_questions_numbered_in_order() {
        assert_eq!(INTERVIEW_QUESTIONS.len(), 9);
        for (i, q) in INTERVIEW_QUESTIONS.iter().enumerate() {
            assert_eq!(q.number as usize, i + 1);
        }
    }

    #[test]
    fn lookup_by_index_and_number_agree() {
        let by_index = question_by_index(4).unwrap();
        let by_number = question_by_number(5).unwrap();
        assert_eq!(by_index.number, by_number.number);
        assert!(question_by_index(9).is_none());
        assert!(question_by_number(0).is_none());
    }
}
