use futures::channel::oneshot;
use image::RgbaImage;
use log::{debug, warn};
use parking_lot::{Mutex, MutexGuard};
use std::future::Future;
use std::sync::Arc;
use std::thread;

use super::Surface;
use crate::canvas::Canvas;
use crate::element::DrawableContainerList;
use crate::error::{EditorError, EditorResult};
use crate::filter::RenderMode;

/// Owned copy of a surface's background and elements.
#[derive(Debug, Clone)]
pub struct RenderSnapshot {
    background: RgbaImage,
    elements: DrawableContainerList,
}

impl RenderSnapshot {
    pub fn new(background: RgbaImage, elements: DrawableContainerList) -> Self {
        Self { background, elements }
    }

    /// Flatten into a new bitmap: background, then each container with its filters, in z-order.
    pub fn render(&self, mode: RenderMode) -> RgbaImage {
        let mut canvas = Canvas::new(self.background.clone());
        self.elements.draw(&mut canvas, mode);
        canvas.into_image()
    }
}

/// A surface that other threads can reach.
///
/// All access goes through one lock. Background renders copy what they need
/// while holding it and then work on the copy, so a finished bitmap is handed
/// over whole and never sees a half-applied undo.
#[derive(Debug, Clone)]
pub struct SharedSurface {
    inner: Arc<Mutex<Surface>>,
}

impl SharedSurface {
    pub fn new(surface: Surface) -> Self {
        Self { inner: Arc::new(Mutex::new(surface)) }
    }

    pub fn lock(&self) -> MutexGuard<'_, Surface> {
        self.inner.lock()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Surface) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Render on a worker thread; the future resolves to the complete bitmap.
    pub fn render_in_background(&self, mode: RenderMode) -> impl Future<Output = EditorResult<RgbaImage>> + use<> {
        let snapshot = self.inner.lock().snapshot();
        let (sender, receiver) = oneshot::channel();
        let spawned = thread::Builder::new().name("surface-render".into()).spawn(move || {
            let image = snapshot.render(mode);
            debug!("background render finished ({}x{})", image.width(), image.height());
            if sender.send(image).is_err() {
                debug!("background render dropped, nobody is waiting");
            }
        });
        if let Err(err) = &spawned {
            warn!("could not start render thread: {err}");
        }
        async move { receiver.await.map_err(|_| EditorError::SurfaceGone) }
    }
}
