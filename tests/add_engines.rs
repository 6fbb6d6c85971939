//! Engine registration through plugins

mod common;

use code_analyzer::plugin_loader::{ModulePluginResolver, PluginModule};
use code_analyzer::{AnalyzerError, CodeAnalyzer, Config, EventType, LogLevel};
use common::*;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn engines_from_plugin_are_registered_sorted() {
    let analyzer = CodeAnalyzer::default();
    let (eslint, pmd) = eslint_and_pmd();
    analyzer
        .add_engine_plugin(Arc::new(StubPlugin::new(vec![pmd, eslint])))
        .await
        .unwrap();
    assert_eq!(analyzer.engine_names(), vec!["eslint", "pmd"]);
}

#[tokio::test]
async fn failing_engine_does_not_block_its_siblings() {
    let analyzer = CodeAnalyzer::default();
    let logs = capture(&analyzer, EventType::Log);

    let plugin = StubPlugin::new(vec![
        Arc::new(StubEngine::new("e1", vec![])),
        Arc::new(StubEngine::new("e2", vec![])),
    ])
    .failing_create("e1", "boom");
    analyzer.add_engine_plugin(Arc::new(plugin)).await.unwrap();

    assert_eq!(analyzer.engine_names(), vec!["e2"]);
    let errors = error_logs(&logs);
    assert_eq!(errors.len(), 1, "errors: {:?}", errors);
    assert!(errors[0].contains("e1") && errors[0].contains("boom"));
}

#[tokio::test]
async fn duplicate_engine_is_registered_once() {
    let analyzer = CodeAnalyzer::default();
    let logs = capture(&analyzer, EventType::Log);

    let first = Arc::new(StubEngine::new("dup", vec![]));
    let second = Arc::new(StubEngine::new("dup", vec![]));
    analyzer
        .add_engine_plugin(Arc::new(StubPlugin::new(vec![first])))
        .await
        .unwrap();
    analyzer
        .add_engine_plugin(Arc::new(StubPlugin::new(vec![second])))
        .await
        .unwrap();

    assert_eq!(analyzer.engine_names(), vec!["dup"]);
    let errors = error_logs(&logs);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("'dup'") && errors[0].contains("already added"));
}

#[tokio::test]
async fn engine_reporting_another_name_is_discarded() {
    let analyzer = CodeAnalyzer::default();
    let logs = capture(&analyzer, EventType::Log);

    let plugin = StubPlugin::new(vec![]).declaring("requested", Arc::new(StubEngine::new("actual", vec![])));
    analyzer.add_engine_plugin(Arc::new(plugin)).await.unwrap();

    assert!(analyzer.engine_names().is_empty());
    let errors = error_logs(&logs);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("'requested'") && errors[0].contains("'actual'"));
}

#[tokio::test]
async fn failure_to_list_engine_names_is_fatal() {
    let analyzer = CodeAnalyzer::default();
    let err = analyzer
        .add_engine_plugin(Arc::new(BrokenPlugin))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AnalyzerError::PluginErrorFromGetAvailableEngineNames { .. }
    ));
    assert!(err.to_string().contains("cannot list engines"));
}

#[tokio::test]
async fn plugin_from_future_api_is_accepted_with_warning() {
    let analyzer = CodeAnalyzer::default();
    let logs = capture(&analyzer, EventType::Log);

    let plugin = StubPlugin::new(vec![Arc::new(StubEngine::new("future", vec![]))]).with_api_version(99);
    analyzer.add_engine_plugin(Arc::new(plugin)).await.unwrap();

    assert_eq!(analyzer.engine_names(), vec!["future"]);
    let warnings: Vec<String> = log_lines(&logs)
        .into_iter()
        .filter(|(level, _)| *level == LogLevel::Warn)
        .map(|(_, message)| message)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("99") && warnings[0].contains("\"future\""));
}

#[tokio::test]
async fn engine_receives_its_config_with_config_root() {
    let config: Config = serde_json::from_str(
        r#"{
            "configRoot": "/opt/project",
            "engines": { "eslint": { "eslint_config_file": ".eslintrc.json" } }
        }"#,
    )
    .unwrap();
    let analyzer = CodeAnalyzer::new(config);
    let (eslint, pmd) = eslint_and_pmd();
    let plugin = Arc::new(StubPlugin::new(vec![eslint, pmd]));
    analyzer.add_engine_plugin(plugin.clone()).await.unwrap();

    let eslint_config = plugin.received_config("eslint").unwrap();
    assert_eq!(eslint_config["eslint_config_file"], ".eslintrc.json");
    assert_eq!(eslint_config["config_root"], "/opt/project");
    assert_eq!(plugin.received_config("pmd").unwrap().len(), 1);
}

#[tokio::test]
async fn engine_config_description_comes_from_owning_plugin() {
    let analyzer = CodeAnalyzer::default();
    let (eslint, _) = eslint_and_pmd();
    analyzer
        .add_engine_plugin(Arc::new(StubPlugin::new(vec![eslint])))
        .await
        .unwrap();

    assert_eq!(
        analyzer.describe_engine_config("eslint").as_deref(),
        Some("Configuration for eslint")
    );
    assert_eq!(analyzer.describe_engine_config("pmd"), None);
}

#[tokio::test]
async fn plugin_is_loaded_from_registered_module() {
    let dir = TempDir::new().unwrap();
    let module_path = dir.path().join("stub-plugin.js");
    fs::write(&module_path, "").unwrap();

    let resolver = Arc::new(ModulePluginResolver::new());
    resolver
        .register_module(
            &module_path,
            PluginModule::with_factory(|| {
                let (eslint, pmd) = eslint_and_pmd();
                Arc::new(StubPlugin::new(vec![eslint, pmd]))
            }),
        )
        .unwrap();

    let config = Config {
        config_root: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    let analyzer = CodeAnalyzer::new(config).with_plugin_resolver(resolver);
    analyzer
        .dynamically_add_engine_plugin("stub-plugin.js")
        .await
        .unwrap();

    assert_eq!(analyzer.engine_names(), vec!["eslint", "pmd"]);
}

#[tokio::test]
async fn dynamic_loading_failures_are_fatal() {
    let dir = TempDir::new().unwrap();
    let helpers = dir.path().join("helpers.js");
    fs::write(&helpers, "").unwrap();

    let resolver = Arc::new(ModulePluginResolver::new());
    resolver
        .register_module(
            &helpers,
            PluginModule::new().export("some_other_function", || Arc::new(BrokenPlugin)),
        )
        .unwrap();

    let config = Config {
        config_root: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    let analyzer = CodeAnalyzer::new(config).with_plugin_resolver(resolver);

    let err = analyzer
        .dynamically_add_engine_plugin("doesNotExist.js")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::FailedToDynamicallyLoadModule { .. }));

    let err = analyzer
        .dynamically_add_engine_plugin("helpers.js")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::FailedToDynamicallyAddEnginePlugin { .. }));
    assert!(analyzer.engine_names().is_empty());
}
