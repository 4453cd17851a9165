use std::sync::Arc;

use strata_core::hash::hash_raster;
use strata_core::{Color, RasterBuffer, StrataError};
use strata_ir::{Canvas, GradientSpec, Layer, LayerContent};
use strata_render::blend::BlendInput;
use strata_render::{
    BlendCapabilities, BlendRegistry, FilterRegistry, Renderer, RendererOptions, SoftwareBackend,
};

fn renderer() -> Renderer {
    Renderer::with_software_defaults()
}

/// Helper: render a canvas and unwrap the produced buffer.
async fn flatten(canvas: &Canvas) -> RasterBuffer {
    renderer()
        .render(canvas)
        .await
        .expect("render should succeed")
        .expect("render should produce an image")
}

#[tokio::test]
async fn conformance_solid_red_fill() {
    // Canvas{100x100, [fill(red)]} renders to a 100x100 solid red buffer.
    let canvas = Canvas::new(100, 100).with_layer(Layer::fill(Color::RED));
    let out = flatten(&canvas).await;
    assert_eq!(out.width, 100);
    assert_eq!(out.height, 100);
    for x in [0, 50, 99] {
        for y in [0, 50, 99] {
            assert_eq!(out.get_pixel(x, y), Some([255, 0, 0, 255]));
        }
    }
}

#[tokio::test]
async fn conformance_manual_multiply_matches_direct_blend() {
    // Bottom red fill, top half-opacity blue multiply over the full
    // canvas: the output must equal the manual multiply function applied
    // with opacity 0.5 at dx=dy=0, width=height=100.
    let canvas = Canvas::new(100, 100)
        .with_layer(Layer::fill(Color::RED))
        .with_layer(
            Layer::fill(Color::BLUE)
                .with_opacity(0.5)
                .with_blend_mode("multiply"),
        );
    let out = flatten(&canvas).await;

    let registry = BlendRegistry::default();
    let multiply = registry.get("multiply").unwrap();
    let base = RasterBuffer::solid(100, 100, &Color::RED);
    let mut expected = base.clone();
    let top = RasterBuffer::solid(100, 100, &Color::BLUE);
    multiply(
        &base.data,
        &mut expected.data,
        100,
        100,
        &BlendInput {
            data: &top.data,
            width: 100,
            height: 100,
            opacity: 0.5,
            dx: 0,
            dy: 0,
        },
    )
    .unwrap();

    assert_eq!(out, expected);
}

#[tokio::test]
async fn conformance_unregistered_blend_mode_is_fatal() {
    let canvas = Canvas::new(10, 10)
        .with_layer(Layer::fill(Color::RED))
        .with_layer(Layer::fill(Color::BLUE).with_blend_mode("hue"));
    let result = renderer().render(&canvas).await;
    assert!(matches!(
        result,
        Err(StrataError::NoSuchBlendMode(mode)) if mode == "hue"
    ));
}

#[tokio::test]
async fn conformance_render_is_deterministic() {
    let canvas = Canvas::new(64, 64)
        .with_layer(Layer::new(LayerContent::Gradient {
            gradient: GradientSpec::linear(Color::BLACK, Color::WHITE).with_rotation(30.0),
        }))
        .with_layer(
            Layer::fill(Color::RED)
                .with_opacity(0.4)
                .with_blend_mode("screen")
                .with_rotation(15.0)
                .with_scale(0.75, 0.75),
        );

    let first = hash_raster(&flatten(&canvas).await);
    let second = hash_raster(&flatten(&canvas).await);
    assert_eq!(first, second, "same canvas must produce identical hashes");
}

#[tokio::test]
async fn conformance_different_canvases_hash_differently() {
    let red = Canvas::new(16, 16).with_layer(Layer::fill(Color::RED));
    let blue = Canvas::new(16, 16).with_layer(Layer::fill(Color::BLUE));
    let h1 = hash_raster(&flatten(&red).await);
    let h2 = hash_raster(&flatten(&blue).await);
    assert_ne!(h1, h2);
}

#[tokio::test]
async fn conformance_native_runs_keep_layer_order() {
    // lighter is native to the software backend, multiply is manual: this
    // stack alternates implementation paths, but the top opaque layer must
    // still win everywhere it covers.
    let canvas = Canvas::new(16, 16)
        .with_layer(Layer::fill(Color::RED))
        .with_layer(Layer::fill(Color::rgba(0.0, 0.2, 0.0, 1.0)).with_blend_mode("lighter"))
        .with_layer(Layer::fill(Color::WHITE).with_blend_mode("multiply"))
        .with_layer(Layer::fill(Color::BLUE));
    let out = flatten(&canvas).await;
    assert_eq!(out.get_pixel(8, 8), Some([0, 0, 255, 255]));
}

#[tokio::test]
async fn conformance_gradient_layer_spans_canvas() {
    let canvas = Canvas::new(100, 50).with_layer(Layer::new(LayerContent::Gradient {
        gradient: GradientSpec::linear(Color::BLACK, Color::WHITE),
    }));
    let out = flatten(&canvas).await;
    let left = out.get_pixel(0, 25).unwrap();
    let right = out.get_pixel(99, 25).unwrap();
    assert!(left[0] < 10);
    assert!(right[0] > 245);
}

#[tokio::test]
async fn conformance_nested_mask_chain() {
    // A masked layer whose mask is itself a gradient canvas: alpha must
    // fall off along the gradient axis.
    let mask = Canvas::new(1, 1).with_layer(Layer::new(LayerContent::Gradient {
        gradient: GradientSpec::linear(Color::WHITE, Color::BLACK),
    }));
    let canvas = Canvas::new(64, 64).with_layer(Layer::fill(Color::RED).with_mask(mask));
    let out = flatten(&canvas).await;
    let left_alpha = out.get_pixel(1, 32).unwrap()[3];
    let right_alpha = out.get_pixel(62, 32).unwrap()[3];
    assert!(left_alpha > 240, "left alpha {}", left_alpha);
    assert!(right_alpha < 15, "right alpha {}", right_alpha);
}

#[tokio::test]
async fn conformance_custom_capability_table_forces_native_path() {
    // Declaring "multiply" native sends it to the backend as a composite
    // op the software backend cannot execute: the render must surface
    // that as an error instead of silently reordering.
    let renderer = Renderer::new(
        Arc::new(SoftwareBackend::new()),
        FilterRegistry::default(),
        BlendRegistry::default(),
        BlendCapabilities::from_native(["multiply"]),
        RendererOptions::default(),
    );
    let canvas = Canvas::new(8, 8)
        .with_layer(Layer::fill(Color::RED))
        .with_layer(Layer::fill(Color::BLUE).with_blend_mode("multiply"));
    let result = renderer.render(&canvas).await;
    assert!(matches!(result, Err(StrataError::Render(_))));
}

#[tokio::test]
async fn conformance_flip_mirrors_output() {
    let mut raster = RasterBuffer::new(2, 1);
    raster.set_pixel(0, 0, [255, 0, 0, 255]);
    raster.set_pixel(1, 0, [0, 0, 255, 255]);
    let canvas = Canvas::new(2, 1).with_layer(
        Layer::new(LayerContent::ExternalRaster { raster }).with_flip(true, false),
    );
    let out = flatten(&canvas).await;
    assert_eq!(out.get_pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(out.get_pixel(1, 0), Some([255, 0, 0, 255]));
}
