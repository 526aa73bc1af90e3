use crate::models::{FoodEntry, NutrientTotals};

/// Sum calories and macros across `entries`. The caller filters by date.
#[must_use]
pub fn sum_nutrients(entries: &[FoodEntry]) -> NutrientTotals {
    entries
        .iter()
        .fold(NutrientTotals::default(), |totals, e| NutrientTotals {
            calories: totals.calories + e.calories,
            protein: totals.protein + e.protein,
            carbs: totals.carbs + e.carbs,
            fat: totals.fat + e.fat,
        })
}
