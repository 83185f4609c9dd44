//! Rule-based request planner.
//!
//! The planner annotates a request with goals, advisory steps and clarifying
//! questions before the prompt is built. Rules are evaluated in the order of
//! [`RULES`]. Goal rules form a cascade: the first goal rule whose predicate
//! matches wins and the remaining goal rules are skipped, with
//! [`GOAL_NEWS_ARTICLE`] as the unconditional last entry. This guarantees that
//! every plan carries exactly one goal. Step and question effects are
//! independent and may all fire.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Goal for video narration requests.
pub const GOAL_VIDEO_SCRIPT: &str = "Tulis skrip narasi untuk video";
/// Goal for investigative requests.
pub const GOAL_INVESTIGATIVE: &str = "Tulis artikel investigatif dengan alur kronologis";
/// Default goal.
pub const GOAL_NEWS_ARTICLE: &str = "Tulis artikel berita yang lengkap, mendalam, dan faktual";
/// Step added when the request asks who is pictured.
pub const STEP_DETECT_FIGURES: &str = "Analisa gambar untuk mendeteksi tokoh atau objek penting";
/// Step added when there is no caption yet.
pub const STEP_DESCRIBE_IMAGE: &str = "Buat deskripsi gambar lebih dulu";
/// Question raised for investigative requests.
pub const QUESTION_TIME_PLACE: &str =
    "Kapan dan di mana peristiwa terjadi? Adakah data waktu dan lokasi yang dapat dipastikan?";

static VIDEO_KEYWORDS: LazyLock<Option<Regex>> = LazyLock::new(|| keywords(r"video"));
static INVESTIGATION_KEYWORDS: LazyLock<Option<Regex>> =
    LazyLock::new(|| keywords(r"investigasi|investigat"));
static IDENTITY_KEYWORDS: LazyLock<Option<Regex>> =
    LazyLock::new(|| keywords(r"identitas|identity|siapa|\bwho\b"));

fn keywords(pattern: &str) -> Option<Regex> {
    match Regex::new(&format!("(?i)(?:{pattern})")) {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::error!("Invalid planner keyword pattern {pattern:?}: {err}");
            None
        }
    }
}

fn mentions(keywords: &LazyLock<Option<Regex>>, text: &str) -> bool {
    keywords
        .as_ref()
        .is_some_and(|regex| regex.is_match(text))
}

/// Goals, steps and questions attached to a request.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlannerResult {
    /// What the article should be. Always exactly one entry from [`plan`].
    pub goals: Vec<String>,
    /// Advisory steps, in rule order.
    pub steps: Vec<String>,
    /// Clarifying questions, in rule order.
    pub questions: Vec<String>,
}

/// What a matching rule contributes to the plan.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Effect {
    /// Sets the goal. Only the first matching goal rule applies.
    Goal(&'static str),
    /// Sets the goal and raises a question alongside it.
    GoalWithQuestion(&'static str, &'static str),
    /// Adds an advisory step.
    Step(&'static str),
}

/// Inputs a rule predicate looks at.
#[derive(Clone, Copy, Debug)]
pub struct PlannerInput<'a> {
    /// Caption produced for the image, or placeholder text.
    pub caption: &'a str,
    /// What the user asked for.
    pub instruction: &'a str,
}

/// A predicate and the effect it has when it holds.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Short name used in logs.
    pub name: &'static str,
    /// Whether the rule applies.
    pub applies: fn(&PlannerInput<'_>) -> bool,
    /// What it adds.
    pub effect: Effect,
}

/// Planner rules in priority order.
pub static RULES: &[Rule] = &[
    Rule {
        name: "video",
        applies: |input| mentions(&VIDEO_KEYWORDS, input.instruction),
        effect: Effect::Goal(GOAL_VIDEO_SCRIPT),
    },
    Rule {
        name: "investigation",
        applies: |input| mentions(&INVESTIGATION_KEYWORDS, input.instruction),
        effect: Effect::GoalWithQuestion(GOAL_INVESTIGATIVE, QUESTION_TIME_PLACE),
    },
    Rule {
        name: "default-goal",
        applies: |_| true,
        effect: Effect::Goal(GOAL_NEWS_ARTICLE),
    },
    Rule {
        name: "identity",
        applies: |input| mentions(&IDENTITY_KEYWORDS, input.instruction),
        effect: Effect::Step(STEP_DETECT_FIGURES),
    },
    Rule {
        name: "missing-caption",
        applies: |input| input.caption.trim().is_empty(),
        effect: Effect::Step(STEP_DESCRIBE_IMAGE),
    },
];

/// Plans a request using [`RULES`].
pub fn plan(caption: &str, instruction: &str) -> PlannerResult {
    plan_with(RULES, caption, instruction)
}

/// Plans a request with an explicit rule list.
pub fn plan_with(rules: &[Rule], caption: &str, instruction: &str) -> PlannerResult {
    let input = PlannerInput {
        caption,
        instruction,
    };
    let mut result = PlannerResult::default();
    let mut goal_set = false;

    for rule in rules {
        let is_goal = matches!(rule.effect, Effect::Goal(_) | Effect::GoalWithQuestion(..));
        if is_goal && goal_set {
            continue;
        }
        if !(rule.applies)(&input) {
            continue;
        }
        tracing::debug!("Planner rule {} matched", rule.name);
        match rule.effect {
            Effect::Goal(goal) => {
                result.goals.push(goal.to_string());
                goal_set = true;
            }
            Effect::GoalWithQuestion(goal, question) => {
                result.goals.push(goal.to_string());
                result.questions.push(question.to_string());
                goal_set = true;
            }
            Effect::Step(step) => result.steps.push(step.to_string()),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_wins_over_everything() {
        for caption in ["", "a crowd at a rally", "   "] {
            let result = plan(caption, "Buat VIDEO investigasi tentang banjir");
            assert_eq!(result.goals, vec![GOAL_VIDEO_SCRIPT.to_string()]);
            assert!(result.questions.is_empty());
        }
    }

    #[test]
    fn investigation_adds_question() {
        let result = plan("a burnt warehouse", "Tolong tulis laporan Investigasi");
        assert_eq!(result.goals, vec![GOAL_INVESTIGATIVE.to_string()]);
        assert_eq!(result.questions, vec![QUESTION_TIME_PLACE.to_string()]);

        let result = plan("a burnt warehouse", "an investigative piece please");
        assert_eq!(result.goals, vec![GOAL_INVESTIGATIVE.to_string()]);
        assert!(!result.questions.is_empty());
    }

    #[test]
    fn plain_request_gets_default_goal_only() {
        let result = plan("people at a market", "Tulis berita viral 1000 kata");
        assert_eq!(result.goals, vec![GOAL_NEWS_ARTICLE.to_string()]);
        assert!(result.steps.is_empty());
        assert!(result.questions.is_empty());
    }

    #[test]
    fn empty_caption_asks_for_description() {
        for caption in ["", " ", "\n\t"] {
            for instruction in ["video", "investigasi", "siapa dia", "berita"] {
                let result = plan(caption, instruction);
                assert!(result.steps.contains(&STEP_DESCRIBE_IMAGE.to_string()));
                assert_eq!(result.goals.len(), 1);
            }
        }
    }

    #[test]
    fn identity_keywords_add_detection_step() {
        let result = plan("a man on stage", "Siapa tokoh di foto ini?");
        assert_eq!(result.steps, vec![STEP_DETECT_FIGURES.to_string()]);

        let result = plan("a man on stage", "Who is speaking?");
        assert_eq!(result.steps, vec![STEP_DETECT_FIGURES.to_string()]);

        let result = plan("a man on stage", "Describe the whole scene");
        assert!(result.steps.is_empty());
    }

    #[test]
    fn steps_keep_rule_order() {
        let result = plan("", "ungkap identitas pelaku");
        assert_eq!(
            result.steps,
            vec![
                STEP_DETECT_FIGURES.to_string(),
                STEP_DESCRIBE_IMAGE.to_string()
            ]
        );
    }

    #[test]
    fn first_goal_rule_wins_in_custom_lists() {
        let rules = [
            Rule {
                name: "always",
                applies: |_| true,
                effect: Effect::Goal("first"),
            },
            Rule {
                name: "also-always",
                applies: |_| true,
                effect: Effect::GoalWithQuestion("second", "ignored?"),
            },
        ];
        let result = plan_with(&rules, "caption", "anything");
        assert_eq!(result.goals, vec!["first".to_string()]);
        assert!(result.questions.is_empty());
    }
}
