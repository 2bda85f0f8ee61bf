//! Running geometry changes against a [`GeometryHost`].
//!
//! Every change that mutates runs inside exactly one undo group and is
//! followed by exactly one flush. Requests that would not change anything
//! return [`GeometryOutcome::Skipped`] without touching the host.

use crate::buffer::{ContentBounds, Interpolation};
use crate::error::CommandError;
use crate::progress::{Progress, ProgressFactory, ProgressScope};
use crate::undo::UndoKind;

use super::host::{GeometryHost, ItemRef};
use super::request::{GeometryRequest, Unit};

/// Whether a geometry change was applied.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryOutcome {
    Applied,
    /// Nothing to do; the host was not touched.
    Skipped,
}

/// Undo group that closes when dropped.
pub struct UndoGroup<'h, H: GeometryHost + ?Sized> {
    host: &'h mut H,
    open: bool,
}

impl<'h, H: GeometryHost + ?Sized> UndoGroup<'h, H> {
    pub fn begin(host: &'h mut H, kind: UndoKind, label: &str) -> Self {
        host.undo_group_start(kind, label);
        Self { host, open: true }
    }

    pub fn host(&mut self) -> &mut H {
        &mut *self.host
    }

    pub fn end(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.host.undo_group_end();
        }
    }
}

impl<H: GeometryHost + ?Sized> Drop for UndoGroup<'_, H> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Change the canvas size of `item`.
///
/// Skipped when the requested size equals the current size, even if the
/// offsets differ.
pub fn resize<H: GeometryHost + ?Sized>(
    host: &mut H,
    item: ItemRef,
    request: &GeometryRequest,
    label: &str,
) -> Result<GeometryOutcome, CommandError> {
    let current = host.item_size(item)?;
    if current == request.size() {
        tracing::debug!(?item, "resize skipped, size unchanged");
        return Ok(GeometryOutcome::Skipped);
    }

    tracing::debug!(
        ?item,
        width = request.width(),
        height = request.height(),
        offset_x = request.offset_x(),
        offset_y = request.offset_y(),
        "resizing"
    );
    apply_resize(host, item, request, label)?;
    Ok(GeometryOutcome::Applied)
}

/// Resample `item` to the requested size.
///
/// Progress goes to `display` when given, otherwise to a standalone surface
/// from `factory` that is destroyed once the scale has ended.
pub fn scale<H: GeometryHost + ?Sized>(
    host: &mut H,
    item: ItemRef,
    request: &GeometryRequest,
    interpolation: Interpolation,
    display: Option<&mut dyn Progress>,
    factory: &mut dyn ProgressFactory,
) -> Result<GeometryOutcome, CommandError> {
    let current = host.item_size(item)?;
    if current == request.size() {
        tracing::debug!(?item, "scale skipped, size unchanged");
        return Ok(GeometryOutcome::Skipped);
    }

    tracing::debug!(
        ?item,
        width = request.width(),
        height = request.height(),
        ?interpolation,
        "scaling"
    );
    let mut scope = ProgressScope::begin(display, factory, "Scaling");
    {
        let mut group = UndoGroup::begin(host, UndoKind::ItemScale, "Scale Layer");
        group.host().scale_item(
            item,
            request.width(),
            request.height(),
            interpolation,
            scope.progress(),
        )?;
        group.end();
    }
    scope.finish();
    host.flush();
    Ok(GeometryOutcome::Applied)
}

/// Crop `item` to a rectangle given in image coordinates.
pub fn crop_to_rect<H: GeometryHost + ?Sized>(
    host: &mut H,
    item: ItemRef,
    rect: (i32, i32, u32, u32),
    label: &str,
) -> Result<GeometryOutcome, CommandError> {
    let (x, y, width, height) = rect;
    let (off_x, off_y) = host.item_offset(item)?;
    let request = GeometryRequest::new(
        width as i64,
        height as i64,
        off_x - x,
        off_y - y,
        Unit::Pixel,
    )?;

    if host.item_size(item)? == request.size() && (off_x, off_y) == (x, y) {
        tracing::debug!(?item, "crop skipped, bounds unchanged");
        return Ok(GeometryOutcome::Skipped);
    }

    apply_resize(host, item, &request, label)?;
    Ok(GeometryOutcome::Applied)
}

/// Crop `item` to the bounding box of its content.
///
/// # Errors
///
/// `EmptyContent` when the item is fully transparent and `AlreadyMinimal`
/// when content touches every edge. Neither touches the host.
pub fn crop_to_content<H: GeometryHost + ?Sized>(
    host: &mut H,
    item: ItemRef,
) -> Result<GeometryOutcome, CommandError> {
    match host.content_bounds(item)? {
        ContentBounds::Shrinkable {
            x,
            y,
            width,
            height,
        } => {
            let request =
                GeometryRequest::new(width as i64, height as i64, -x, -y, Unit::Pixel)?;
            apply_resize(host, item, &request, "Crop Layer to Content")?;
            Ok(GeometryOutcome::Applied)
        }
        ContentBounds::EmptyContent => Err(CommandError::EmptyContent),
        ContentBounds::AlreadyMinimal => Err(CommandError::AlreadyMinimal),
    }
}

fn apply_resize<H: GeometryHost + ?Sized>(
    host: &mut H,
    item: ItemRef,
    request: &GeometryRequest,
    label: &str,
) -> Result<(), CommandError> {
    {
        let mut group = UndoGroup::begin(host, UndoKind::ItemResize, label);
        group.host().resize_item(
            item,
            request.width(),
            request.height(),
            request.offset_x(),
            request.offset_y(),
        )?;
        group.end();
    }
    host.flush();
    Ok(())
}
