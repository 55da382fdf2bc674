// Deterministic insights: priority recommendation, keyword suggestions, daily summary
//
// Everything here is rule evaluation over fixed tables. Nothing is learned and
// nothing is persisted.

use crate::models::{Priority, Task, today};
use crate::storage::Storage;
use crate::store::TaskStore;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Number of suggestions shown in the compact preview
pub const PREVIEW_LIMIT: usize = 3;

/// A keyword vocabulary and the suggestions it unlocks
struct Category {
    name: &'static str,
    keywords: &'static [&'static str],
    suggestions: [&'static str; 3],
}

// Order matters: suggestions are appended work, personal, learning
const CATEGORIES: [Category; 3] = [
    Category {
        name: "work",
        keywords: &["meeting", "project", "work", "client", "report", "presentation"],
        suggestions: [
            "Schedule a team meeting to discuss project progress",
            "Review and update project documentation",
            "Plan next week's work priorities",
        ],
    },
    Category {
        name: "personal",
        keywords: &["exercise", "health", "family", "home", "personal"],
        suggestions: [
            "Set aside time for personal development",
            "Plan a healthy meal for tomorrow",
            "Schedule exercise or outdoor activity",
        ],
    },
    Category {
        name: "learning",
        keywords: &["learn", "study", "course", "read", "research", "skill"],
        suggestions: [
            "Research new industry trends",
            "Take an online course or tutorial",
            "Read an article related to your field",
        ],
    },
];

/// Returned when no completed task matches any vocabulary
pub const FALLBACK_SUGGESTIONS: [&str; 5] = [
    "Review your goals for this week",
    "Plan tomorrow's priorities",
    "Take a 15-minute break to recharge",
    "Organize your workspace",
    "Connect with a colleague or friend",
];

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

// ============================================================================
// Priority recommendation
// ============================================================================

/// Outcome of the recommendation rules, first match wins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    /// Pending tasks due strictly before today
    Overdue(usize),
    /// Pending high-priority tasks, none overdue
    HighPriority(usize),
    /// Pending work, nothing urgent
    KeepGoing,
    /// Nothing pending
    AllDone,
}

impl Recommendation {
    pub fn evaluate(tasks: &[Task], today: NaiveDate) -> Self {
        let pending: Vec<&Task> = tasks.iter().filter(|task| task.is_pending()).collect();

        let overdue = pending.iter().filter(|task| task.is_overdue_on(today)).count();
        if overdue > 0 {
            return Recommendation::Overdue(overdue);
        }

        let high = pending.iter().filter(|task| task.priority == Priority::High).count();
        if high > 0 {
            return Recommendation::HighPriority(high);
        }

        if !pending.is_empty() {
            return Recommendation::KeepGoing;
        }

        Recommendation::AllDone
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Recommendation::Overdue(n) => write!(
                f,
                "You have {} overdue task{}. Focus on completing them first!",
                n,
                plural(n)
            ),
            Recommendation::HighPriority(n) => write!(
                f,
                "You have {} high-priority task{}. Consider tackling them next.",
                n,
                plural(n)
            ),
            Recommendation::KeepGoing => {
                write!(f, "Great job! No urgent tasks. Focus on medium-priority items to stay productive.")
            }
            Recommendation::AllDone => {
                write!(f, "All tasks completed! Time to add new goals or take a well-deserved break.")
            }
        }
    }
}

pub fn priority_recommendation(tasks: &[Task], today: NaiveDate) -> String {
    Recommendation::evaluate(tasks, today).to_string()
}

// ============================================================================
// Suggestions
// ============================================================================

/// Which vocabularies appear in at least one completed task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskPatterns {
    pub has_work: bool,
    pub has_personal: bool,
    pub has_learning: bool,
}

impl TaskPatterns {
    pub fn analyze(tasks: &[Task]) -> Self {
        let mut matched = [false; 3];

        for task in tasks.iter().filter(|task| task.completed) {
            let text = format!("{} {}", task.title, task.description).to_lowercase();
            for (flag, category) in matched.iter_mut().zip(CATEGORIES.iter()) {
                if !*flag && category.keywords.iter().any(|keyword| text.contains(keyword)) {
                    *flag = true;
                }
            }
        }

        Self {
            has_work: matched[0],
            has_personal: matched[1],
            has_learning: matched[2],
        }
    }

    fn flags(&self) -> [bool; 3] {
        [self.has_work, self.has_personal, self.has_learning]
    }

    pub fn is_empty(&self) -> bool {
        !self.flags().contains(&true)
    }

    /// Names of the matched categories, in suggestion order
    pub fn categories(&self) -> Vec<&'static str> {
        self.flags()
            .iter()
            .zip(CATEGORIES.iter())
            .filter(|(flag, _)| **flag)
            .map(|(_, category)| category.name)
            .collect()
    }
}

/// Canned suggestions for the completed tasks in `tasks`, at most `cap`
pub fn suggestions(tasks: &[Task], cap: usize) -> Vec<&'static str> {
    let patterns = TaskPatterns::analyze(tasks);

    if patterns.is_empty() {
        return FALLBACK_SUGGESTIONS.iter().copied().take(cap).collect();
    }

    patterns
        .flags()
        .iter()
        .zip(CATEGORIES.iter())
        .filter(|(flag, _)| **flag)
        .flat_map(|(_, category)| category.suggestions.iter().copied())
        .take(cap)
        .collect()
}

// ============================================================================
// Daily summary
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub completed_today: usize,
    pub pending: usize,
    pub productivity_percent: u32,
    pub high_priority_pending: usize,
    pub completed_today_titles: Vec<String>,
    pub insights: Vec<String>,
}

impl DailySummary {
    pub fn compute(tasks: &[Task], date: NaiveDate) -> Self {
        let completed_today: Vec<&Task> = tasks.iter().filter(|task| task.completed_on(date)).collect();
        let pending = tasks.iter().filter(|task| task.is_pending()).count();
        let high_priority_pending = tasks
            .iter()
            .filter(|task| task.is_pending() && task.priority == Priority::High)
            .count();

        let productivity_percent = if tasks.is_empty() {
            0
        } else {
            (completed_today.len() as f64 / tasks.len() as f64 * 100.0).round() as u32
        };

        Self {
            date,
            completed_today: completed_today.len(),
            pending,
            productivity_percent,
            high_priority_pending,
            completed_today_titles: completed_today.iter().map(|task| task.title.clone()).collect(),
            insights: daily_insights(completed_today.len(), pending, high_priority_pending),
        }
    }
}

/// Threshold messages: completed count, then high-priority backlog, then pending
pub fn daily_insights(completed: usize, pending: usize, high_priority: usize) -> Vec<String> {
    let mut insights = Vec::new();

    insights.push(match completed {
        0 => "No tasks completed today. Consider starting with a small, achievable task to build momentum.".to_string(),
        1 => "Good start! You completed 1 task today. Keep the momentum going.".to_string(),
        2..=3 => format!("Great progress! You completed {} tasks today. You're on a roll!", completed),
        _ => format!("Excellent work! You completed {} tasks today. You're highly productive!", completed),
    });

    if high_priority > 0 {
        insights.push(format!(
            "You have {} high-priority task{} remaining. Consider tackling them tomorrow.",
            high_priority,
            plural(high_priority)
        ));
    }

    match pending {
        0 => insights.push("Amazing! No pending tasks. You're all caught up!".to_string()),
        1..=3 => insights.push(format!("You have {} task{} remaining. Almost there!", pending, plural(pending))),
        _ => {}
    }

    insights
}

// ============================================================================
// Store entry points
// ============================================================================

impl<S: Storage> TaskStore<S> {
    /// Recommendation for today
    pub fn priority_recommendation(&self) -> String {
        self.priority_recommendation_on(today())
    }

    pub fn priority_recommendation_on(&self, today: NaiveDate) -> String {
        priority_recommendation(self.tasks(), today)
    }

    pub fn suggestions(&self, cap: usize) -> Vec<&'static str> {
        suggestions(self.tasks(), cap)
    }

    pub fn suggestion_preview(&self) -> Vec<&'static str> {
        self.suggestions(PREVIEW_LIMIT)
    }

    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        DailySummary::compute(self.tasks(), date)
    }
}
