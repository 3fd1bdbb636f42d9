//! Prompt for suggesting bulk-mode directions.

use rand::seq::IndexedRandom;
use rand::Rng;

/// Prompt name for logs.
pub const DIRECTIONS_PROMPT_NAME: &str = "directions";

const CUISINES: &[&str] = &[
    "Italian", "Chinese", "Mexican", "Indian", "French", "Japanese", "Thai", "Greek", "Spanish",
    "American",
];
const DIETS: &[&str] = &[
    "Vegetarian",
    "Vegan",
    "Gluten-free",
    "Dairy-free",
    "Keto",
    "Paleo",
    "Low-carb",
    "Low-fat",
];
const METHODS: &[&str] = &[
    "Bake",
    "Grill",
    "Fry",
    "Roast",
    "Steam",
    "Slow cook",
    "Pressure cook",
    "Sauté",
    "Poach",
    "Broil",
];
const MEALS: &[&str] = &[
    "Breakfast",
    "Lunch",
    "Dinner",
    "Dessert",
    "Snack",
    "Appetizer",
    "Side dish",
];

/// Five randomly seeded prompt lines that steer the suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionSeeds(pub Vec<String>);

impl DirectionSeeds {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let fusion: Vec<&str> = CUISINES.choose_multiple(rng, 2).copied().collect();

        Self(vec![
            format!(
                "Create a {} recipe that is {}.",
                pick(rng, CUISINES),
                pick(rng, DIETS)
            ),
            format!(
                "Develop a {} recipe using the {} method.",
                pick(rng, MEALS),
                pick(rng, METHODS)
            ),
            format!("Fusion dishes combining {} cuisines.", fusion.join(" and ")),
            format!(
                "Design a {} recipe for a {}.",
                pick(rng, DIETS),
                pick(rng, MEALS)
            ),
            format!(
                "Create a seasonal recipe using {} as the main cooking method.",
                pick(rng, METHODS)
            ),
        ])
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, list: &[&str]) -> String {
    list.choose(rng).copied().unwrap_or_default().to_string()
}

/// Render the prompt asking for `count` short directions.
pub fn render_directions_prompt(seeds: &DirectionSeeds, count: usize) -> String {
    format!(
        "Generate {count} unique and general recipe idea directions based on the following prompts. \
For example, \"vegan zucchini desserts\" is a good direction, but give original directions in the \
same style, not necessarily related to veganism or zucchini. Each direction should be 3-5 words \
describing the recipe idea direction:\n{seeds}\n\nFormat the output as a JSON array of strings.",
        count = count,
        seeds = seeds.0.join("\n")
    )
}
