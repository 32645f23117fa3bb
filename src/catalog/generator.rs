//! Synthetic product generation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::product::Product;
use crate::error::AppError;

const ADJECTIVES: &[&str] = &[
    "Small",
    "Ergonomic",
    "Rustic",
    "Intelligent",
    "Gorgeous",
    "Incredible",
    "Fantastic",
    "Practical",
    "Sleek",
    "Awesome",
    "Generic",
    "Handcrafted",
    "Handmade",
    "Licensed",
    "Refined",
    "Unbranded",
    "Tasty",
];

const MATERIALS: &[&str] = &[
    "Steel", "Wooden", "Concrete", "Plastic", "Cotton", "Granite", "Rubber", "Metal", "Soft",
    "Fresh", "Frozen",
];

const NOUNS: &[&str] = &[
    "Chair", "Car", "Computer", "Keyboard", "Mouse", "Bike", "Ball", "Gloves", "Pants", "Shirt",
    "Table", "Shoes", "Hat", "Towels", "Soap", "Tuna", "Chicken", "Fish", "Cheese", "Bacon",
    "Pizza", "Salad", "Sausages", "Chips",
];

/// Generates fake catalog products.
///
/// Prices are drawn uniformly from `[min_price, max_price)` and truncated to
/// cents; barcodes are EAN-13 with a correct check digit.
#[derive(Debug)]
pub struct ProductGenerator {
    min_price: f64,
    max_price: f64,
    rng: StdRng,
}

impl ProductGenerator {
    pub fn new(min_price: f64, max_price: f64) -> Result<Self, AppError> {
        Self::with_rng(min_price, max_price, StdRng::from_entropy())
    }

    /// Deterministic generator, for reproducible catalogs.
    pub fn with_seed(min_price: f64, max_price: f64, seed: u64) -> Result<Self, AppError> {
        Self::with_rng(min_price, max_price, StdRng::seed_from_u64(seed))
    }

    fn with_rng(min_price: f64, max_price: f64, rng: StdRng) -> Result<Self, AppError> {
        let valid = min_price.is_finite()
            && max_price.is_finite()
            && min_price >= 0.0
            && min_price < max_price;
        if !valid {
            return Err(AppError::InvalidPriceRange {
                min: min_price,
                max: max_price,
            });
        }

        Ok(Self {
            min_price,
            max_price,
            rng,
        })
    }

    /// Generate exactly `count` products.
    pub fn generate(&mut self, count: usize) -> Vec<Product> {
        (0..count).map(|_| self.product()).collect()
    }

    fn product(&mut self) -> Product {
        Product {
            name: self.name(),
            barcode: self.ean13(),
            price: self.price(),
        }
    }

    fn name(&mut self) -> String {
        let pick = |rng: &mut StdRng, words: &[&'static str]| -> &'static str {
            words.choose(rng).copied().unwrap_or_default()
        };
        format!(
            "{} {} {}",
            pick(&mut self.rng, ADJECTIVES),
            pick(&mut self.rng, MATERIALS),
            pick(&mut self.rng, NOUNS)
        )
    }

    fn ean13(&mut self) -> String {
        let mut code: String = (0..12)
            .map(|_| char::from(b'0' + self.rng.gen_range(0..10u8)))
            .collect();
        // 12 ASCII digits always yield a check digit
        if let Some(check) = ean13_check_digit(&code) {
            code.push(char::from(b'0' + check));
        }
        code
    }

    fn price(&mut self) -> f64 {
        let raw = self.rng.gen_range(self.min_price..self.max_price);
        ((raw * 100.0).floor() / 100.0).max(self.min_price)
    }
}

/// GS1 check digit for the first 12 digits of an EAN-13.
///
/// Returns `None` unless `digits` is exactly 12 ASCII digits.
pub fn ean13_check_digit(digits: &str) -> Option<u8> {
    if digits.len() != 12 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let sum: u32 = digits
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 0 { d } else { d * 3 }
        })
        .sum();

    Some(((10 - sum % 10) % 10) as u8)
}

/// Whether `code` is 13 digits with a correct check digit.
pub fn is_valid_ean13(code: &str) -> bool {
    if code.len() != 13 {
        return false;
    }
    let (body, check) = code.split_at(12);
    match (ean13_check_digit(body), check.bytes().next()) {
        (Some(expected), Some(actual)) if actual.is_ascii_digit() => expected == actual - b'0',
        _ => false,
    }
}
