use vwo::{AttributeValue, Attributes};

pub fn main() -> vwo::Result<()> {
    // Configure env_logger to see VWO SDK logs.
    env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("vwo")).init();

    let account_id = std::env::var("VWO_ACCOUNT_ID")
        .ok()
        .and_then(|id| id.parse().ok())
        .expect("VWO_ACCOUNT_ID env variable should contain a numeric account id");
    let sdk_key =
        std::env::var("VWO_SDK_KEY").expect("VWO_SDK_KEY env variable should contain SDK key");

    let client = vwo::ClientConfig::new(account_id, sdk_key)
        .development_mode(true)
        .event_transport(|event: &vwo::Event| {
            println!("Event: {:?}", event);
            Ok::<_, vwo::Error>(())
        })
        .to_client()?;

    // Until settings are fetched, every decision is negative.
    if let Err(err) = client.fetch_settings() {
        println!("error fetching settings: {:?}", err);
    }

    let attributes: Attributes = [("browser".to_owned(), AttributeValue::from("chrome"))].into();

    // Both report the impression when the user gets a variation.
    let variation = client.activate("campaign-key", "test-user", Some(&attributes));
    println!("variation: {:?}", variation);
    let variation = client.get_variation("campaign-key", "test-user", Some(&attributes));
    println!("variation (get_variation): {:?}", variation);

    let tracked = client.track(
        "campaign-key",
        "test-user",
        "purchase",
        Some(19.99_f64.into()),
        Some(&attributes),
    );
    println!("conversion tracked: {tracked}");

    let enabled = client.is_feature_enabled("feature-key", "test-user", Some(&attributes));
    println!("feature enabled: {enabled}");

    client.shutdown()
}
