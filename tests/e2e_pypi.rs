//! PyPI E2E tests

mod helper;

use mockito::Server;

use dep_inspector::inspect::{PackageRequest, build_report};
use dep_inspector::parser::types::Ecosystem;
use dep_inspector::version::registries::PypiRegistry;
use helper::{create_test_cache, create_test_inspector, create_test_resolver};

const AIOHTTP_3_7_2: &str = r#"{
    "info": {
        "name": "aiohttp",
        "version": "3.7.2",
        "license": "Apache 2",
        "requires_python": ">=3.6",
        "requires_dist": [
            "attrs (>=17.3.0)",
            "aiodns ; extra == 'speedups'"
        ]
    }
}"#;

#[tokio::test]
async fn reports_aiohttp_license_and_dependencies() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/pypi/aiohttp/3.7.2/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(AIOHTTP_3_7_2)
        .expect(1)
        .create_async()
        .await;

    let (_temp_dir, cache) = create_test_cache(Ecosystem::Python, &[]);
    let inspector = create_test_inspector(
        Ecosystem::Python,
        create_test_resolver(Ecosystem::Python, PypiRegistry::new(&server.url())),
        cache,
    );

    let results = inspector
        .inspect(Ecosystem::Python, PackageRequest::parse("aiohttp;3.7.2"), Some(0))
        .await
        .unwrap();

    mock.assert_async().await;
    let report = serde_json::to_value(build_report(&results)).unwrap();
    let entry = &report[0]["aiohttp"]["versions"]["3.7.2"];
    assert_eq!(entry["import_name"], "aiohttp");
    assert_eq!(entry["pkg_lic"], serde_json::json!(["Apache 2"]));
    assert_eq!(entry["lang_ver"], serde_json::json!([">=3.6"]));
    assert_eq!(entry["pkg_dep"], serde_json::json!(["attrs;>=17.3.0"]));
    let timestamp = entry["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn resolves_dependency_constraint_one_level_down() {
    let mut server = Server::new_async().await;
    let _aiohttp = server
        .mock("GET", "/pypi/aiohttp/3.7.2/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(AIOHTTP_3_7_2)
        .create_async()
        .await;
    let _attrs_versions = server
        .mock("GET", "/pypi/attrs/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "info": {"version": "23.1.0"},
                "releases": {"17.2.0": [], "17.3.0": [], "23.1.0": []}
            }"#,
        )
        .create_async()
        .await;
    let attrs = server
        .mock("GET", "/pypi/attrs/23.1.0/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"info": {"name": "attrs", "version": "23.1.0", "license": "MIT", "requires_dist": []}}"#,
        )
        .create_async()
        .await;

    let (_temp_dir, cache) = create_test_cache(Ecosystem::Python, &[]);
    let inspector = create_test_inspector(
        Ecosystem::Python,
        create_test_resolver(Ecosystem::Python, PypiRegistry::new(&server.url())),
        cache,
    );

    let results = inspector
        .inspect(Ecosystem::Python, PackageRequest::parse("aiohttp;3.7.2"), Some(1))
        .await
        .unwrap();

    attrs.assert_async().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[1].pkg_name, "attrs");
    assert_eq!(results[1].pkg_ver, "23.1.0");
    assert_eq!(results[1].pkg_lic, vec!["MIT".to_string()]);
}

#[tokio::test]
async fn missing_package_is_annotated_not_fatal() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/pypi/no-such-package/json")
        .with_status(404)
        .create_async()
        .await;

    let (_temp_dir, cache) = create_test_cache(Ecosystem::Python, &[]);
    let inspector = create_test_inspector(
        Ecosystem::Python,
        create_test_resolver(Ecosystem::Python, PypiRegistry::new(&server.url())),
        cache,
    );

    let results = inspector
        .inspect(Ecosystem::Python, PackageRequest::parse("no-such-package"), None)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].pkg_err.contains_key("registry"));
    assert_eq!(results[0].pkg_lic, vec!["Other".to_string()]);
}
