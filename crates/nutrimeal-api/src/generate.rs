//! Client for the optional AI recipe generator.
//!
//! The generator is an opaque HTTP endpoint with no latency or determinism
//! guarantees. Every failure (unconfigured, timeout, HTTP error, unparseable
//! output) falls back to a templated stub so lookups never fail on it.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use nutrimeal_db::models::NewRecipe;
use nutrimeal_types::models::{Ingredient, deserialize_servings};

const PROMPT: &str = r#"You are a recipe generator. Return only valid JSON matching this schema:

{
  "name": "Recipe name",
  "description": "one sentence",
  "ingredients": [{"name": "string", "amount": "e.g. 200 g", "calories": number}],
  "steps": ["step 1", "step 2"],
  "nutrition": {"totalCalories": number, "servings": number, "caloriesPerServing": number}
}

Task: Create a healthy, tasty recipe for "{dish}". Estimate calories per ingredient for the given amount. Ensure JSON is strictly valid."#;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generator is not configured")]
    Disabled,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generator returned {0}")]
    Status(u16),

    #[error("unusable generator output: {0}")]
    Output(String),
}

#[derive(Debug, Clone)]
pub struct GeneratorEndpoint {
    pub url: String,
    pub api_key: String,
    pub model: String,
}

pub struct RecipeGenerator {
    http: reqwest::Client,
    endpoint: Option<GeneratorEndpoint>,
}

/// Shape the model is asked to produce. Ingredient lines go through the
/// same normalisation as user submissions.
#[derive(Debug, Deserialize)]
struct GeneratedRecipe {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "serving", deserialize_with = "deserialize_servings")]
    servings: Option<u32>,
    #[serde(default)]
    ingredients: Vec<Ingredient>,
    #[serde(default, alias = "instructions")]
    steps: Vec<String>,
    #[serde(default)]
    nutrition: BTreeMap<String, Value>,
}

impl RecipeGenerator {
    pub fn new(endpoint: Option<GeneratorEndpoint>, timeout: Duration) -> Result<Self, GenerateError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint })
    }

    /// A generator that always serves the stub.
    pub fn disabled() -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: None,
        }
    }

    pub async fn generate(&self, dish: &str) -> NewRecipe {
        match self.request(dish).await {
            Ok(recipe) => recipe,
            Err(GenerateError::Disabled) => {
                debug!("Generator not configured, serving stub for '{}'", dish);
                stub_recipe(dish)
            }
            Err(e) => {
                warn!("Recipe generation for '{}' failed, serving stub: {}", dish, e);
                stub_recipe(dish)
            }
        }
    }

    async fn request(&self, dish: &str) -> Result<NewRecipe, GenerateError> {
        let endpoint = self.endpoint.as_ref().ok_or(GenerateError::Disabled)?;

        let resp = self
            .http
            .post(&endpoint.url)
            .bearer_auth(&endpoint.api_key)
            .json(&json!({
                "model": endpoint.model,
                "input": PROMPT.replace("{dish}", dish),
                "response_format": { "type": "json_object" },
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GenerateError::Status(resp.status().as_u16()));
        }

        let body: Value = resp.json().await?;
        parse_output(&body, dish)
    }
}

/// Providers wrap the model text differently; try the common envelopes in
/// order, then fall back to treating the body itself as the recipe.
fn parse_output(body: &Value, dish: &str) -> Result<NewRecipe, GenerateError> {
    let candidate = body
        .pointer("/output/0/content/0/text")
        .or_else(|| body.pointer("/choices/0/message/content"))
        .or_else(|| body.get("content"))
        .unwrap_or(body);

    let recipe: GeneratedRecipe = match candidate {
        Value::String(text) => serde_json::from_str(strip_fences(text)),
        other => serde_json::from_value(other.clone()),
    }
    .map_err(|e| GenerateError::Output(e.to_string()))?;

    if recipe.ingredients.is_empty() || recipe.steps.is_empty() {
        return Err(GenerateError::Output("missing ingredients or steps".into()));
    }

    let name = if recipe.name.trim().is_empty() {
        title_case(dish)
    } else {
        recipe.name
    };

    Ok(NewRecipe {
        name,
        description: recipe.description,
        servings: recipe.servings,
        ingredients: recipe.ingredients,
        steps: recipe.steps,
        nutrition: recipe.nutrition,
        ..Default::default()
    })
}

fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn title_case(dish: &str) -> String {
    let dish = dish.trim();
    let mut chars = dish.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Templated recipe served when the generator is unavailable. It carries
/// the requested dish name so the lookup stays stable once stored.
pub fn stub_recipe(dish: &str) -> NewRecipe {
    let ingredient = |item: &str, quantity: &str, unit: &str, calories: f64| Ingredient {
        quantity: quantity.into(),
        unit: unit.into(),
        item: item.into(),
        calories: Some(calories),
    };

    let dish = dish.trim();
    let mut nutrition = BTreeMap::new();
    nutrition.insert("servings".to_string(), json!(2));

    NewRecipe {
        name: title_case(dish),
        description: Some(format!("A quick home-style take on {}.", dish)),
        servings: Some(2),
        ingredients: vec![
            ingredient("olive oil", "1", "tbsp", 119.0),
            ingredient(dish, "200", "g", 250.0),
            ingredient("onion", "1", "small", 28.0),
            ingredient("garlic", "2", "cloves", 9.0),
            ingredient("salt", "", "to taste", 0.0),
            ingredient("black pepper", "1/2", "tsp", 3.0),
        ],
        steps: vec![
            "Prep the ingredients: chop the onion and garlic.".into(),
            format!("Heat the oil, add the {} and saute until fragrant.", dish),
            "Add the onion and garlic and cook until soft.".into(),
            "Season with salt and pepper and adjust to taste.".into(),
            "Serve warm, garnished with fresh herbs if you like.".into(),
        ],
        nutrition,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_style_envelope_with_fences() {
        let content = "```json\n{\"name\":\"Dal\",\"ingredients\":[\"200 lentils\",{\"name\":\"salt\",\"amount\":\"1\"}],\"instructions\":[\"Boil\"]}\n```";
        let body = json!({ "choices": [{ "message": { "content": content } }] });

        let recipe = parse_output(&body, "dal").unwrap();
        assert_eq!(recipe.name, "Dal");
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].quantity, "200");
        assert_eq!(recipe.ingredients[1].item, "salt");
        assert_eq!(recipe.steps, vec!["Boil".to_string()]);
    }

    #[test]
    fn parses_bare_json_body() {
        let body = json!({
            "ingredients": [{ "item": "rice", "quantity": "1", "unit": "cup" }],
            "steps": ["Cook"],
        });

        let recipe = parse_output(&body, "fried rice").unwrap();
        assert_eq!(recipe.name, "Fried rice");
    }

    #[test]
    fn rejects_output_without_steps() {
        let body = json!({ "output": [{ "content": [{ "text": "{\"name\":\"x\",\"ingredients\":[\"1 egg\"]}" }] }] });
        assert!(matches!(parse_output(&body, "x"), Err(GenerateError::Output(_))));
    }

    #[tokio::test]
    async fn disabled_generator_serves_the_stub() {
        let recipe = RecipeGenerator::disabled().generate("shakshuka").await;
        assert_eq!(recipe.name, "Shakshuka");
        assert!(!recipe.ingredients.is_empty());
        assert!(!recipe.steps.is_empty());
    }
}
