use chrono::{Duration, NaiveDate, Utc};
use fake::faker::address::en::StateName;
use fake::faker::lorem::en::Word;
use fake::Fake;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;

/// Product categories drawn from when generating products.
pub const CATEGORIES: [&str; 5] = ["Electronics", "Home", "Fashion", "Grocery", "Sports"];

const MIN_PRICE_CENTS: i64 = 500;
const MAX_PRICE_CENTS: i64 = 50_000;
const MAX_QUANTITY: i32 = 10;
const INVOICE_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub unit_price: Decimal,
    pub state: String,
}

/// Invoice awaiting insertion. `product_index` points into the product
/// drafts of the same batch and is swapped for the stored id on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub product_index: usize,
    pub quantity: i32,
    pub invoice_date: NaiveDate,
    pub customer_state: String,
}

/// Synthetic data source for seeding.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedGenerator;

impl SeedGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(
        &self,
        num_products: usize,
        num_invoices: usize,
    ) -> (Vec<ProductDraft>, Vec<InvoiceDraft>) {
        let mut rng = rand::thread_rng();
        self.generate_with_rng(&mut rng, Utc::now().date_naive(), num_products, num_invoices)
    }

    /// Generates drafts using `rng`, dating invoices relative to `today`.
    ///
    /// Without products there is nothing to reference, so no invoices are
    /// produced.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        today: NaiveDate,
        num_products: usize,
        num_invoices: usize,
    ) -> (Vec<ProductDraft>, Vec<InvoiceDraft>) {
        let products: Vec<ProductDraft> = (0..num_products)
            .map(|_| ProductDraft {
                name: title_case(&Word().fake_with_rng::<String, _>(rng)),
                category: CATEGORIES
                    .choose(rng)
                    .copied()
                    .unwrap_or(CATEGORIES[0])
                    .to_string(),
                unit_price: Decimal::new(rng.gen_range(MIN_PRICE_CENTS..=MAX_PRICE_CENTS), 2),
                state: StateName().fake_with_rng(rng),
            })
            .collect();

        if products.is_empty() {
            return (products, Vec::new());
        }

        let invoices = (0..num_invoices)
            .map(|_| InvoiceDraft {
                product_index: rng.gen_range(0..products.len()),
                quantity: rng.gen_range(1..=MAX_QUANTITY),
                invoice_date: today - Duration::days(rng.gen_range(0..=INVOICE_WINDOW_DAYS)),
                customer_state: StateName().fake_with_rng(rng),
            })
            .collect();

        (products, invoices)
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    #[test]
    fn drafts_stay_within_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (products, invoices) = SeedGenerator::new().generate_with_rng(&mut rng, today, 25, 400);

        assert_eq!(products.len(), 25);
        assert_eq!(invoices.len(), 400);

        for product in &products {
            assert!(!product.name.is_empty());
            assert!(product.name.chars().next().unwrap().is_uppercase());
            assert!(CATEGORIES.contains(&product.category.as_str()));
            assert!(product.unit_price >= dec!(5.00) && product.unit_price <= dec!(500.00));
            assert_eq!(product.unit_price.scale(), 2);
            assert!(!product.state.is_empty());
        }

        let earliest = today - Duration::days(365);
        for invoice in &invoices {
            assert!(invoice.product_index < products.len());
            assert!((1..=10).contains(&invoice.quantity));
            assert!(invoice.invoice_date <= today && invoice.invoice_date >= earliest);
            assert!(!invoice.customer_state.is_empty());
        }
    }

    #[test]
    fn no_products_means_no_invoices() {
        let (products, invoices) = SeedGenerator::new().generate(0, 50);
        assert!(products.is_empty());
        assert!(invoices.is_empty());
    }

    #[test]
    fn title_case_capitalizes_first_letter() {
        assert_eq!(title_case("lamp"), "Lamp");
        assert_eq!(title_case(""), "");
    }
}
