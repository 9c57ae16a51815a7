/*!
 * Tests for the translation facade: cache, fallback, batching, ordering
 */

use std::sync::Arc;

use cuebatch::errors::TranslationError;
use cuebatch::translation::TranslateOptions;

use crate::common::mock_backends::{MockBackend, MockFailure};
use crate::common::test_service;

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withEmptyInput_shouldReturnEmptyWithoutCalls() {
    let (service, _config) = test_service();
    let backend = Arc::new(MockBackend::new("alpha"));
    let tracker = backend.tracker();
    service.register_backend(backend);

    let result = service
        .translate_batch(&[], "en", "es", &TranslateOptions::default())
        .await
        .unwrap();

    assert!(result.is_empty());
    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.single_calls, 0);
    assert_eq!(tracker.batch_calls, 0);
    // No rate-limit consumption either
    assert_eq!(service.rate_limit_status("alpha").unwrap().requests, 0);
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_shouldPreserveInputOrder() {
    let (service, config) = test_service();
    config.write().global_batch_size = 3;
    service.register_backend(Arc::new(MockBackend::new("alpha")));

    let input: Vec<String> = (0..10).map(|i| format!("cue number {}", i)).collect();
    let output = service
        .translate_batch(&input, "en", "es", &TranslateOptions::default())
        .await
        .unwrap();

    assert_eq!(output.len(), input.len());
    for (i, text) in input.iter().enumerate() {
        assert_eq!(output[i], MockBackend::translated(text, "es"));
    }
}

#[tokio::test(start_paused = true)]
async fn test_translate_repeatedKey_shouldIssueAtMostOneProviderCall() {
    let (service, _config) = test_service();
    let backend = Arc::new(MockBackend::new("alpha"));
    let tracker = backend.tracker();
    service.register_backend(backend);

    let options = TranslateOptions::default();
    let first = service.translate("hello", "en", "es", &options).await.unwrap();
    let second = service.translate("hello", "en", "es", &options).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(tracker.lock().unwrap().single_calls, 1);

    let (hits, _, _) = service.cache_stats();
    assert_eq!(hits, 1);
}

#[tokio::test(start_paused = true)]
async fn test_translate_cacheHit_shouldCountAsSavedApiCall() {
    let (service, _config) = test_service();
    service.register_backend(Arc::new(MockBackend::new("alpha")));

    let options = TranslateOptions::default();
    service.translate("hello", "en", "es", &options).await.unwrap();
    service.translate("hello", "en", "es", &options).await.unwrap();

    let metrics = service.performance_metrics();
    assert_eq!(metrics.total_items, 2);
    assert_eq!(metrics.provider_calls, 1);
    assert_eq!(metrics.api_calls_saved, 1);
    // Direct calls form no batches and leave the mean batch size alone
    assert_eq!(metrics.total_batches, 0);
    assert_eq!(metrics.average_batch_size, 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withFailingMiddleItem_shouldReturnOriginalInPlace() {
    let (service, config) = test_service();
    // "beta" has no native batch support, so this runs the simulated path
    config.write().provider = "beta".to_string();
    config.write().global_batch_size = 3;
    service.register_backend(Arc::new(MockBackend::new("beta")));

    let output = service
        .translate_batch(
            &texts(&["Hello", "FAIL_ME", "World"]),
            "en",
            "es",
            &TranslateOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(output.len(), 3);
    assert_eq!(output[0], MockBackend::translated("Hello", "es"));
    assert_eq!(output[1], "FAIL_ME");
    assert_eq!(output[2], MockBackend::translated("World", "es"));

    assert_eq!(service.performance_metrics().items_degraded, 1);
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withNativeFailure_shouldFallBackToPerItemCalls() {
    let (service, config) = test_service();
    config.write().global_batch_size = 3;
    let backend = Arc::new(MockBackend::with_failure("alpha", MockFailure::NativeBatch));
    let tracker = backend.tracker();
    service.register_backend(backend);

    let output = service
        .translate_batch(&texts(&["a", "b", "c"]), "en", "es", &TranslateOptions::default())
        .await
        .unwrap();

    assert_eq!(output[0], MockBackend::translated("a", "es"));
    assert_eq!(output[2], MockBackend::translated("c", "es"));
    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.batch_calls, 1);
    assert_eq!(tracker.single_calls, 3);
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withSegmentCountMismatch_shouldPadNotFail() {
    let (service, config) = test_service();
    config.write().global_batch_size = 3;
    service.register_backend(Arc::new(MockBackend::with_failure(
        "alpha",
        MockFailure::DropLastSegment,
    )));

    let output = service
        .translate_batch(&texts(&["a", "b", "c"]), "en", "es", &TranslateOptions::default())
        .await
        .unwrap();

    // Repaired by padding: length is stable, the missing tail is empty
    assert_eq!(output.len(), 3);
    assert_eq!(output[0], MockBackend::translated("a", "es"));
    assert_eq!(output[2], "");
}

#[tokio::test(start_paused = true)]
async fn test_translate_withFailingPrimary_shouldRetryConfiguredFallback() {
    let (service, config) = test_service();
    config.write().fallback_providers = vec!["beta".to_string()];
    service.register_backend(Arc::new(MockBackend::with_failure("alpha", MockFailure::All)));
    service.register_backend(Arc::new(MockBackend::new("beta")));

    let output = service
        .translate("hello", "en", "es", &TranslateOptions::default())
        .await
        .unwrap();
    assert_eq!(output, MockBackend::translated("hello", "es"));
}

#[tokio::test(start_paused = true)]
async fn test_translate_withRetryDisabled_shouldPropagateProviderError() {
    let (service, config) = test_service();
    config.write().fallback_providers = vec!["beta".to_string()];
    service.register_backend(Arc::new(MockBackend::with_failure("alpha", MockFailure::All)));
    service.register_backend(Arc::new(MockBackend::new("beta")));

    let options = TranslateOptions {
        allow_retry: false,
        ..TranslateOptions::default()
    };
    let result = service.translate("hello", "en", "es", &options).await;
    assert!(matches!(result, Err(TranslationError::Provider(_))));
}

#[tokio::test(start_paused = true)]
async fn test_translate_withUnknownProvider_shouldSurfaceConfigurationError() {
    let (service, _config) = test_service();
    let options = TranslateOptions {
        provider: Some("gamma".to_string()),
        ..TranslateOptions::default()
    };
    let result = service.translate("hello", "en", "es", &options).await;
    match result {
        Err(err) => assert!(err.is_configuration_error()),
        Ok(_) => panic!("expected UnknownProvider error"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_nativeBatch_shouldSaveApiCalls() {
    let (service, config) = test_service();
    config.write().global_batch_size = 5;
    service.register_backend(Arc::new(MockBackend::new("alpha")));

    service
        .translate_batch(
            &texts(&["one", "two", "three", "four", "five"]),
            "en",
            "es",
            &TranslateOptions::default(),
        )
        .await
        .unwrap();

    let metrics = service.performance_metrics();
    assert_eq!(metrics.total_batches, 1);
    assert_eq!(metrics.total_items, 5);
    assert_eq!(metrics.provider_calls, 1);
    assert_eq!(metrics.api_calls_saved, 4);
    assert!(metrics.api_call_reduction_percentage > 79.0);
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withBatchingDisabled_shouldTranslateIndividually() {
    let (service, config) = test_service();
    config.write().batching_enabled = false;
    let backend = Arc::new(MockBackend::new("alpha"));
    let tracker = backend.tracker();
    service.register_backend(backend);

    let output = service
        .translate_batch(&texts(&["a", "b"]), "en", "es", &TranslateOptions::default())
        .await
        .unwrap();

    assert_eq!(output.len(), 2);
    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.batch_calls, 0);
    assert_eq!(tracker.single_calls, 2);
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_cachedItems_shouldSkipProviderEntirely() {
    let (service, config) = test_service();
    config.write().global_batch_size = 3;
    let backend = Arc::new(MockBackend::new("alpha"));
    let tracker = backend.tracker();
    service.register_backend(backend);

    let input = texts(&["x", "y", "z"]);
    let options = TranslateOptions::default();
    let first = service.translate_batch(&input, "en", "es", &options).await.unwrap();
    let second = service.translate_batch(&input, "en", "es", &options).await.unwrap();

    assert_eq!(first, second);
    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.batch_calls, 1);
    assert_eq!(tracker.single_calls, 0);
}
