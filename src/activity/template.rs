use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Fitness,
    Health,
    Career,
    Relationships,
    Personal,
    Education,
    Hobbies,
    Finance,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Fitness,
        Category::Health,
        Category::Career,
        Category::Relationships,
        Category::Personal,
        Category::Education,
        Category::Hobbies,
        Category::Finance,
    ];
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Fitness => "Fitness",
            Category::Health => "Health",
            Category::Career => "Career",
            Category::Relationships => "Relationships",
            Category::Personal => "Personal",
            Category::Education => "Education",
            Category::Hobbies => "Hobbies",
            Category::Finance => "Finance",
        };
        f.write_str(name)
    }
}

/// One trackable habit and its default daily target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub default_value: Option<f64>,
    pub unit: Option<&'static str>,
}

const fn template(
    id: &'static str,
    name: &'static str,
    category: Category,
    default_value: f64,
    unit: &'static str,
) -> ActivityTemplate {
    ActivityTemplate {
        id,
        name,
        category,
        default_value: Some(default_value),
        unit: Some(unit),
    }
}

/// Every day that was never saved starts from these.
pub const DEFAULT_ACTIVITIES: [ActivityTemplate; 8] = [
    template("1", "Gym Workout", Category::Fitness, 1., "session"),
    template("2", "Shower", Category::Health, 1., "session"),
    template("3", "Take Finasteride", Category::Health, 1., "pill"),
    template("4", "Take Creatine", Category::Health, 5., "grams"),
    template("5", "Boxing Training", Category::Fitness, 60., "minutes"),
    template("6", "Coding Session", Category::Career, 120., "minutes"),
    template("7", "Read", Category::Education, 30., "minutes"),
    template("8", "Meditation", Category::Personal, 15., "minutes"),
];
