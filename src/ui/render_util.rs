use super::{Arc, ColorImage, ImageBuffer, ImageFrame, RenderImage, Rgba};

pub(super) fn scene_to_image(scene: ColorImage) -> Option<Arc<RenderImage>> {
    let (width, height) = (scene.width, scene.height);
    let mut pixels = scene.into_raw();

    // GPUI expects BGRA; convert in place to avoid the async asset pipeline and flicker.
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }

    let buffer = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(width, height, pixels)?;
    let frame = ImageFrame::new(buffer);

    Some(Arc::new(RenderImage::new(vec![frame])))
}
