use jointfab_sim::{load_config, run_scenario, Config, Report};
use jointfab_types::{EndpointId, FabricIndex, TrustError};
use jointfab_verifier::memory::VendorVerdict;
use tokio::task::LocalSet;

const EXAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/jointfab.example.toml");

async fn run(config: &Config) -> Report {
    let trust = LocalSet::new().run_until(run_scenario(config)).await;
    Report::from(&trust)
}

#[tokio::test]
async fn demo_world_is_trusted() {
    let report = run(&Config::default()).await;

    assert!(report.succeeded());
    assert_eq!(report.result, "SUCCESS");
    assert_eq!(
        report.administrator.local_admin_fabric_index,
        FabricIndex(1)
    );
    assert_eq!(report.administrator.rcac, "15300108aa");
    assert_eq!(report.administrator.icac, "15300108cc");
}

#[tokio::test]
async fn example_config_is_trusted() {
    let config = load_config(Some(EXAMPLE)).unwrap();

    let report = run(&config).await;

    assert_eq!(report.result, "SUCCESS");
    assert_eq!(report.administrator.admin_fabric_index, Some(FabricIndex(3)));
    assert_eq!(
        report.administrator.local_admin_fabric_index,
        FabricIndex(2)
    );
}

#[tokio::test]
async fn report_serializes_to_json() {
    let report = run(&Config::default()).await;

    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["result"], "SUCCESS");
    assert_eq!(value["administrator"]["endpoint_id"], 1);
    assert_eq!(value["administrator"]["admin_fabric_index"], 3);
    assert_eq!(value["administrator"]["fabric_id"], 0x2A);
    assert_eq!(value["administrator"]["vendor_id"], 0xFFF1);
    let key = value["administrator"]["root_public_key"].as_str().unwrap();
    assert_eq!(key.len(), 130);
    assert!(key.starts_with("0411"));
}

#[tokio::test]
async fn accessing_another_fabric_is_mismatched() {
    let mut config = load_config(Some(EXAMPLE)).unwrap();
    config.scenario.accessing_fabric_index = FabricIndex(1);

    let trust = LocalSet::new().run_until(run_scenario(&config)).await;

    assert_eq!(trust.result, Err(TrustError::AdministratorIdMismatched));
    assert_eq!(Report::from(&trust).result, "ADMINISTRATOR_ID_MISMATCHED");
}

#[tokio::test]
async fn rejected_vendor_is_reported() {
    let mut config = Config::default();
    config.scenario.vendor_verdict = VendorVerdict::Reject;

    let report = run(&config).await;

    assert!(!report.succeeded());
    assert_eq!(report.result, "VENDOR_ID_VERIFICATION_FAILED");
    assert_eq!(
        report.administrator.local_admin_fabric_index,
        FabricIndex(1)
    );
}

#[tokio::test]
async fn null_admin_fabric_index_is_reported() {
    let mut config = Config::default();
    config.scenario.peer.administrator_fabric_index = None;

    let report = run(&config).await;

    assert_eq!(report.result, "READ_ADMIN_FABRIC_INDEX_FAILED");
    assert_eq!(report.administrator.admin_fabric_index, None);
    assert!(report.administrator.rcac.is_empty());
}

#[tokio::test]
async fn invalid_endpoint_is_reported() {
    let mut config = Config::default();
    config.scenario.admin_endpoint_id = EndpointId::INVALID;

    let report = run(&config).await;

    assert_eq!(report.result, "INVALID_ADMINISTRATOR_ENDPOINT_ID");
}
