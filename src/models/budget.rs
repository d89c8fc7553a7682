use serde::{Deserialize, Serialize};

/// Places API `priceLevel`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceLevel {
    #[serde(rename = "PRICE_LEVEL_FREE")]
    Free,
    #[serde(rename = "PRICE_LEVEL_INEXPENSIVE")]
    Inexpensive,
    #[serde(rename = "PRICE_LEVEL_MODERATE")]
    Moderate,
    #[serde(rename = "PRICE_LEVEL_EXPENSIVE")]
    Expensive,
    #[serde(rename = "PRICE_LEVEL_VERY_EXPENSIVE")]
    VeryExpensive,
    /// Missing or unrecognised; priced like a moderate restaurant
    #[default]
    #[serde(other, rename = "PRICE_LEVEL_UNSPECIFIED")]
    Unspecified,
}

impl PriceLevel {
    pub fn level(self) -> u8 {
        match self {
            PriceLevel::Free => 0,
            PriceLevel::Inexpensive => 1,
            PriceLevel::Moderate | PriceLevel::Unspecified => 2,
            PriceLevel::Expensive => 3,
            PriceLevel::VeryExpensive => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Lunch,
    Dinner,
}

/// Coarse budget bucket shown next to each recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Value,
    Average,
    Premium,
}

impl From<PriceLevel> for BudgetTier {
    fn from(price_level: PriceLevel) -> Self {
        match price_level.level() {
            0 | 1 => BudgetTier::Value,
            2 => BudgetTier::Average,
            _ => BudgetTier::Premium,
        }
    }
}

impl BudgetTier {
    pub fn label(self) -> &'static str {
        match self {
            BudgetTier::Value => "Good value",
            BudgetTier::Average => "Average",
            BudgetTier::Premium => "Premium",
        }
    }

    /// Yen bounds per person; `None` upper bound means open-ended
    pub fn bounds(self, meal: MealType) -> (u32, Option<u32>) {
        match (meal, self) {
            (MealType::Lunch, BudgetTier::Value) => (0, Some(1_000)),
            (MealType::Lunch, BudgetTier::Average) => (1_000, Some(2_000)),
            (MealType::Lunch, BudgetTier::Premium) => (2_000, None),
            (MealType::Dinner, BudgetTier::Value) => (0, Some(3_000)),
            (MealType::Dinner, BudgetTier::Average) => (3_000, Some(6_000)),
            (MealType::Dinner, BudgetTier::Premium) => (6_000, None),
        }
    }

    /// Price range string such as "¥1,000〜¥2,000" or "¥6,000〜"
    pub fn price_range(self, meal: MealType) -> String {
        match self.bounds(meal) {
            (min, Some(max)) => format!("¥{}〜¥{}", group_thousands(min), group_thousands(max)),
            (min, None) => format!("¥{}〜", group_thousands(min)),
        }
    }
}

fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
