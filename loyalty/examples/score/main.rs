use std::fs::File;

use loyalty::{CustomerRecord, Feature, FieldValues, ModelRole};

pub fn main() -> loyalty::Result<()> {
    // Configure env_logger to see loyalty logs.
    env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("loyalty")).init();

    // Run from the workspace root with LOYALTY_MODELS_DIR=test-data/models to use test artifacts.
    let client = loyalty::ClientConfig::from_env().to_client();
    client.load_models()?;

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "test-data/customers.json".to_owned());
    let customers: Vec<CustomerRecord> = serde_json::from_reader(File::open(&path)?)?;

    let population = client.score_population(&customers)?;
    for scored in &population {
        println!(
            "customer {:>5}: risk {:6.2} (p_subscribe {:.3}, frequency {:.2} ~ {})",
            &*scored.record.customer_id,
            scored.metrics.loyalty_risk,
            scored.metrics.p_subscribe,
            scored.metrics.predicted_frequency_score,
            scored.metrics.frequency_band().label(),
        );
    }

    if let Some(summary) = client.risk_summary(&population) {
        println!("Risk summary: {:?}", summary);
    }

    for segment in client.segment_risk(&population, Feature::ShippingType)? {
        println!(
            "{:>15}: {} customers, mean risk {:.2}",
            &*segment.segment, segment.customers, segment.mean_loyalty_risk
        );
    }

    if let Some(customer) = customers.first() {
        let changes: FieldValues = [
            ("discount_applied".to_owned(), true.into()),
            ("promo_code_used".to_owned(), true.into()),
        ]
        .into();
        let scenario = client.simulate(customer, &changes)?;
        println!(
            "Offering a discount to customer {} changes risk by {:+.2}",
            customer.customer_id, scenario.delta.loyalty_risk
        );
    }

    for entry in client.top_importances(ModelRole::Subscription, 5)? {
        println!("{:>30}: {:.3}", entry.feature_name, entry.importance);
    }

    Ok(())
}
