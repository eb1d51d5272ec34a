//! Rule System
//!
//! A rule is an ordered chain of typed conditions plus the verdict it hands
//! down when the chain holds. Each condition carries its own parameters, so a
//! validated rule can never hit a missing or mistyped parameter at
//! evaluation time.
//!
//! Conditions combine as a strict left-fold in authored order: the first
//! condition seeds the accumulator and each later one folds in with its own
//! operator. `[A, B(AND), C(NOT)]` is `(A AND B) AND NOT C`.

use serde::{Deserialize, Serialize};

use crate::context::RuleEvaluationContext;

/// Verdict a triggered rule hands down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    /// Turn continues; lower-priority rules still run
    Continue,
    Win,
    Lose,
}

impl RuleOutcome {
    /// Win or lose; stops evaluation of lower-priority rules
    #[inline]
    pub fn is_decisive(self) -> bool {
        !matches!(self, Self::Continue)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Win => "win",
            Self::Lose => "lose",
        }
    }
}

impl std::fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a condition folds into the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
    /// `acc AND NOT current`
    Not,
}

impl LogicalOperator {
    /// Fold `current` into `acc`
    #[inline]
    pub fn fold(self, acc: bool, current: bool) -> bool {
        match self {
            Self::And => acc && current,
            Self::Or => acc || current,
            Self::Not => acc && !current,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

/// Wheel a wedge condition looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelTarget {
    Outer,
    Inner,
    /// Either wheel
    Both,
}

impl WheelTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outer => "outer",
            Self::Inner => "inner",
            Self::Both => "both",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "outer" => Some(Self::Outer),
            "inner" => Some(Self::Inner),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// Wedge combination matching mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Both wheels match simultaneously
    Exact,
    /// At least one wheel matches
    Any,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Any => "any",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "exact" => Some(Self::Exact),
            "any" => Some(Self::Any),
            _ => None,
        }
    }
}

/// Score comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Gte,
    Lte,
    Eq,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Eq => "eq",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "gte" => Some(Self::Gte),
            "lte" => Some(Self::Lte),
            "eq" => Some(Self::Eq),
            _ => None,
        }
    }

    #[inline]
    pub fn compare(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Gte => value >= threshold,
            Self::Lte => value <= threshold,
            Self::Eq => (value - threshold).abs() < 1e-9,
        }
    }
}

/// Condition type with its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionKind {
    /// Named wedge was selected on the target wheel
    SpecificWedge { wedge_id: String, wheel: WheelTarget },
    /// Same match as `SpecificWedge`. Reports that the forbidden wedge was
    /// hit; negate with `NOT` to require avoiding it.
    AvoidWedge { wedge_id: String, wheel: WheelTarget },
    WedgeCombination {
        outer_wedge_id: String,
        inner_wedge_id: String,
        match_type: MatchType,
    },
    ScoreThreshold { threshold: f64, comparison: Comparison },
    /// Player's last `count` turns all scored points
    ConsecutiveWins { count: u32 },
    /// Type name not recognised; always false
    Unknown { type_name: String },
}

impl ConditionKind {
    /// Wire name of the condition type
    pub fn type_name(&self) -> &str {
        match self {
            Self::SpecificWedge { .. } => "specific_wedge",
            Self::AvoidWedge { .. } => "avoid_wedge",
            Self::WedgeCombination { .. } => "wedge_combination",
            Self::ScoreThreshold { .. } => "score_threshold",
            Self::ConsecutiveWins { .. } => "consecutive_wins",
            Self::Unknown { type_name } => type_name,
        }
    }

    /// Evaluate against a context
    pub fn evaluate(&self, ctx: &RuleEvaluationContext) -> bool {
        let spin = &ctx.current_spin;
        match self {
            Self::SpecificWedge { wedge_id, wheel } | Self::AvoidWedge { wedge_id, wheel } => {
                let outer = spin.outer_wedge_id == *wedge_id;
                let inner = spin.inner_wedge_id.as_deref() == Some(wedge_id.as_str());
                match wheel {
                    WheelTarget::Outer => outer,
                    WheelTarget::Inner => inner,
                    WheelTarget::Both => outer || inner,
                }
            }
            Self::WedgeCombination {
                outer_wedge_id,
                inner_wedge_id,
                match_type,
            } => {
                let outer = spin.outer_wedge_id == *outer_wedge_id;
                let inner = spin.inner_wedge_id.as_deref() == Some(inner_wedge_id.as_str());
                match match_type {
                    MatchType::Exact => outer && inner,
                    MatchType::Any => outer || inner,
                }
            }
            Self::ScoreThreshold {
                threshold,
                comparison,
            } => comparison.compare(ctx.player_score as f64, *threshold),
            Self::ConsecutiveWins { count } => {
                let needed = *count as usize;
                let turns: Vec<_> = ctx.player_history().collect();
                turns.len() >= needed && turns[turns.len() - needed..].iter().all(|t| t.points > 0)
            }
            Self::Unknown { type_name } => {
                log::warn!("Unknown condition type '{type_name}' evaluates to false");
                false
            }
        }
    }
}

/// One link of a rule's condition chain
#[derive(Debug, Clone, PartialEq)]
pub struct RuleCondition {
    pub id: String,
    /// Ignored on the first condition
    pub operator: LogicalOperator,
    pub kind: ConditionKind,
}

impl RuleCondition {
    pub fn new(id: &str, kind: ConditionKind) -> Self {
        Self {
            id: id.to_string(),
            operator: LogicalOperator::And,
            kind,
        }
    }

    /// Set the fold operator
    pub fn with_operator(mut self, operator: LogicalOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Same type and parameters, whatever the id and operator
    #[inline]
    pub fn same_check(&self, other: &RuleCondition) -> bool {
        self.kind == other.kind
    }
}

/// Complete rule definition
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub name: String,
    /// Higher is evaluated first, in [0, 100]
    pub priority: i32,
    pub is_active: bool,
    pub conditions: Vec<RuleCondition>,
    pub outcome: RuleOutcome,
    pub points: i64,
    pub message: String,
}

impl Rule {
    /// Create an active rule with no conditions
    pub fn new(id: &str, name: &str, outcome: RuleOutcome) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            priority: 50,
            is_active: true,
            conditions: Vec::new(),
            outcome,
            points: 0,
            message: String::new(),
        }
    }

    /// Set priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set points awarded when triggered
    pub fn with_points(mut self, points: i64) -> Self {
        self.points = points;
        self
    }

    /// Set message shown when triggered
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    /// Append a condition
    pub fn with_condition(mut self, condition: RuleCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Enable or disable
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Left-fold the condition chain. A rule without conditions never
    /// triggers. Every condition is evaluated, none are skipped.
    pub fn evaluate(&self, ctx: &RuleEvaluationContext) -> bool {
        let mut chain = self.conditions.iter();
        let Some(first) = chain.next() else {
            return false;
        };
        chain.fold(first.kind.evaluate(ctx), |acc, condition| {
            condition.operator.fold(acc, condition.kind.evaluate(ctx))
        })
    }
}
