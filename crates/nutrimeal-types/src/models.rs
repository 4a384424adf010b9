use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Error returned when a stored or submitted string is not a member of one
/// of the closed enumerations below.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Closed string enumerations shared by the wire format and the store.
/// Parsing is case-insensitive; the canonical spelling is what `as_str` returns.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err(ParseEnumError { kind: $kind, value: s.to_string() })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(Role, "role", {
    User => "user",
    Admin => "admin",
});

string_enum!(RecipeStatus, "recipe status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

string_enum!(ReactionKind, "reaction kind", {
    Like => "like",
    Dislike => "dislike",
});

string_enum!(QueryStatus, "query status", {
    New => "new",
    Resolved => "resolved",
});

// Declaration order is the export order: Monday first.
string_enum!(Day, "day of week", {
    Monday => "Monday",
    Tuesday => "Tuesday",
    Wednesday => "Wednesday",
    Thursday => "Thursday",
    Friday => "Friday",
    Saturday => "Saturday",
    Sunday => "Sunday",
});

string_enum!(MealSlot, "meal slot", {
    Breakfast => "Breakfast",
    Lunch => "Lunch",
    Dinner => "Dinner",
    Snacks => "Snacks",
});

impl RecipeStatus {
    /// Approved and rejected recipes never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecipeStatus::Approved | RecipeStatus::Rejected)
    }
}

// -- Ingredients --

/// A single structured ingredient line.
///
/// Submissions may send either a structured object or a free-text line such
/// as `"2 eggs"`; free text is normalised by peeling a leading numeric token
/// off as the quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawIngredient")]
pub struct Ingredient {
    pub quantity: String,
    pub unit: String,
    pub item: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIngredient {
    Text(String),
    Structured {
        #[serde(default, alias = "amount")]
        quantity: String,
        #[serde(default)]
        unit: String,
        #[serde(default, alias = "name")]
        item: String,
        #[serde(default)]
        calories: Option<f64>,
    },
}

impl From<RawIngredient> for Ingredient {
    fn from(raw: RawIngredient) -> Self {
        match raw {
            RawIngredient::Text(line) => Ingredient::from_line(&line),
            RawIngredient::Structured {
                quantity,
                unit,
                item,
                calories,
            } => Ingredient {
                quantity,
                unit,
                item,
                calories,
            },
        }
    }
}

impl Ingredient {
    pub fn from_line(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let first = parts.next().unwrap_or_default();

        let (quantity, item) = if first.parse::<f64>().is_ok() {
            (first.to_string(), parts.collect::<Vec<_>>().join(" "))
        } else {
            (String::new(), line.split_whitespace().collect::<Vec<_>>().join(" "))
        };

        Ingredient {
            quantity,
            unit: String::new(),
            item,
            calories: None,
        }
    }
}

// -- Records --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub servings: Option<u32>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub cuisine: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    pub nutrition: BTreeMap<String, serde_json::Value>,
    pub image_url: Option<String>,
    pub status: RecipeStatus,
    /// `None` for system-seeded recipes.
    pub submitted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Slim projection used by search and recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanEntry {
    pub id: Uuid,
    pub day_of_week: Day,
    pub meal_type: MealSlot,
    pub recipe_id: Uuid,
    pub recipe_name: String,
    pub image_url: Option<String>,
}

/// One line of a meal-plan export, in day-then-slot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub day: Day,
    pub slot: MealSlot,
    pub recipe_name: String,
    pub description: String,
}

/// A contact-form submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactQuery {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: QueryStatus,
    pub created_at: DateTime<Utc>,
}

/// Aggregate interaction view of one recipe. The caller fields are only
/// present when the request carried a valid session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStats {
    pub like_count: u64,
    pub dislike_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_reaction: Option<ReactionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_is_favorite: Option<bool>,
    pub comments: Vec<Comment>,
}

/// Accepts `4` or `"4"` for servings; blank strings read as absent.
pub fn deserialize_servings<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Servings {
        Number(u32),
        Text(String),
    }

    match Option::<Servings>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Servings::Number(n)) => Ok(Some(n)),
        Some(Servings::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Servings::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid servings '{}'", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("LIKE".parse::<ReactionKind>().unwrap(), ReactionKind::Like);
        assert_eq!("wednesday".parse::<Day>().unwrap(), Day::Wednesday);
        assert_eq!(" Snacks ".parse::<MealSlot>().unwrap(), MealSlot::Snacks);
        assert!("love".parse::<ReactionKind>().is_err());
        assert!("Brunch".parse::<MealSlot>().is_err());
    }

    #[test]
    fn parse_errors_name_the_kind_and_value() {
        let err = "love".parse::<ReactionKind>().unwrap_err();
        assert_eq!(err.to_string(), "invalid reaction kind 'love'");

        let boxed: Box<dyn std::error::Error> = Box::new("Brunch".parse::<MealSlot>().unwrap_err());
        assert!(boxed.to_string().contains("'Brunch'"));
    }

    #[test]
    fn day_and_slot_order_follows_the_week() {
        let mut days = vec![Day::Sunday, Day::Wednesday, Day::Monday];
        days.sort();
        assert_eq!(days, vec![Day::Monday, Day::Wednesday, Day::Sunday]);
        assert!(MealSlot::Breakfast < MealSlot::Snacks);
    }

    #[test]
    fn ingredient_lines_are_normalised() {
        let parsed: Vec<Ingredient> = serde_json::from_str(
            r#"["2 eggs", "salt to taste", {"name": "Olive oil", "amount": "1 tbsp", "calories": 119}]"#,
        )
        .unwrap();

        assert_eq!(parsed[0].quantity, "2");
        assert_eq!(parsed[0].item, "eggs");
        assert_eq!(parsed[1].quantity, "");
        assert_eq!(parsed[1].item, "salt to taste");
        assert_eq!(parsed[2].item, "Olive oil");
        assert_eq!(parsed[2].quantity, "1 tbsp");
        assert_eq!(parsed[2].calories, Some(119.0));
    }

    #[test]
    fn stats_hide_caller_fields_for_anonymous() {
        let stats = RecipeStats {
            like_count: 2,
            dislike_count: 0,
            caller_reaction: None,
            caller_is_favorite: None,
            comments: vec![],
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["likeCount"], 2);
        assert!(json.get("callerReaction").is_none());
        assert!(json.get("callerIsFavorite").is_none());
    }
}
