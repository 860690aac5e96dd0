//! Wire contract tests for the HTTP engine client

use base64::{engine::general_purpose::STANDARD, Engine};
use image::DynamicImage;
use image_tier_gateway::{
    backend::{
        traits::{PipelineVariant, SamplingParams},
        DiffusionEngine, HttpEngine, PipelineSpec,
    },
    config::{EngineConfig, ModelFamily},
    response,
    AppError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine(server: &MockServer) -> HttpEngine {
    HttpEngine::new(&EngineConfig {
        endpoint: server.uri(),
        timeout_ms: 5_000,
        reuse_pipelines: true,
    })
    .unwrap()
}

fn params() -> SamplingParams {
    SamplingParams {
        prompt: "a red circle".to_string(),
        cfg_weight: 5.0,
        num_steps: 20,
        latent_size: (32, 48),
        seed: Some(7),
        verbose: false,
    }
}

fn png_base64(width: u32, height: u32) -> String {
    let bytes = response::encode_png(&DynamicImage::new_rgb8(width, height)).unwrap();
    STANDARD.encode(&bytes)
}

#[tokio::test]
async fn test_load_and_generate() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pipelines"))
        .and(body_partial_json(json!({
            "variant": "sd3",
            "use_t5": false,
            "model_version": "sd3-medium",
            "shift": 3.0,
            "low_memory_mode": true,
            "a16": true,
            "w16": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pipeline_id": "p1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/pipelines/p1/generate"))
        .and(body_partial_json(json!({
            "prompt": "a red circle",
            "num_steps": 20,
            "latent_size": [32, 48],
            "seed": 7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "image": png_base64(384, 256),
            "metadata": {"elapsed": 1.5}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server);
    let spec = PipelineSpec::for_family(ModelFamily::Sd3, "sd3-medium");
    let pipeline = engine.load_pipeline(&spec).await.unwrap();
    assert!(matches!(pipeline.spec().variant, PipelineVariant::StableDiffusion3 { .. }));

    let generated = pipeline.generate_image(&params()).await.unwrap();
    assert_eq!((generated.image.width(), generated.image.height()), (384, 256));
    assert_eq!(generated.metadata.unwrap()["elapsed"], 1.5);
}

#[tokio::test]
async fn test_flux_spec_on_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pipelines"))
        .and(body_partial_json(json!({
            "variant": "flux",
            "model_version": "FLUX.1-schnell",
            "shift": 1.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pipeline_id": "f1"})))
        .expect(1)
        .mount(&server)
        .await;

    let spec = PipelineSpec::for_family(ModelFamily::Flux, "FLUX.1-schnell");
    engine(&server).load_pipeline(&spec).await.unwrap();
}

#[tokio::test]
async fn test_generate_error_detail_is_forwarded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pipelines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pipeline_id": "p1"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/pipelines/p1/generate"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "Metal out of memory"})),
        )
        .mount(&server)
        .await;

    let engine = engine(&server);
    let spec = PipelineSpec::for_family(ModelFamily::Sd3, "sd3-medium");
    let pipeline = engine.load_pipeline(&spec).await.unwrap();

    let err = pipeline.generate_image(&params()).await.unwrap_err();
    assert!(matches!(err, AppError::GenerationFailure(ref m) if m == "Metal out of memory"));
}

#[tokio::test]
async fn test_load_failure_with_plain_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pipelines"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    let spec = PipelineSpec::for_family(ModelFamily::Flux, "missing");
    let err = match engine(&server).load_pipeline(&spec).await {
        Ok(_) => panic!("load should fail"),
        Err(e) => e,
    };

    assert!(matches!(err, AppError::GenerationFailure(_)));
    assert!(err.to_string().contains("model not found"));
}

#[tokio::test]
async fn test_release_resources_hits_cache_clear() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cache/clear"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    engine(&server).release_resources().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_engine_is_generation_failure() {
    let engine = HttpEngine::new(&EngineConfig {
        endpoint: "http://127.0.0.1:9".to_string(),
        timeout_ms: 1_000,
        reuse_pipelines: true,
    })
    .unwrap();

    assert!(matches!(
        engine.release_resources().await,
        Err(AppError::GenerationFailure(_))
    ));
}
