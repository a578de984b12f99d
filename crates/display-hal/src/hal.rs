//! Caller-facing display facade
//!
//! [`HalDisplay`] ties the frame buffer, grayscale compositor, refresh
//! orchestrator and power controller to one [`PanelDriver`]. All calls
//! block until the panel is done; `&mut self` keeps a single writer.

use panel::{PanelDriver, BUFFER_SIZE, DISPLAY_HEIGHT, DISPLAY_WIDTH};

use crate::config::HalConfig;
use crate::error::HalError;
use crate::framebuffer::{check_frame_len, FrameBuffer, ImageSource, Rect, WHITE};
use crate::grayscale::{compose, GrayPlane, GrayscaleCompositor, GrayscalePass, MonoSnapshot};
use crate::power::{PowerController, PowerState};
use crate::refresh::{RefreshMode, RefreshOrchestrator, RefreshStats};

type Result<T, D> = core::result::Result<T, HalError<<D as PanelDriver>::Error>>;

/// Log a driver failure and wrap it.
fn panel_error<E: core::fmt::Debug>(op: &'static str) -> impl FnOnce(E) -> HalError<E> {
    move |error| {
        tracing::warn!(op, ?error, "panel driver failed");
        HalError::Panel(error)
    }
}

/// Write the mono frame `mono` to both controller RAM planes.
fn write_mono_planes<D: PanelDriver>(
    driver: &mut D,
    mono: &[u8],
) -> core::result::Result<(), D::Error> {
    for plane in [GrayPlane::Lsb, GrayPlane::Msb] {
        driver.write_plane(plane.ram_plane(), mono)?;
    }
    Ok(())
}

/// E-paper display HAL for the Xteink X4 panel.
///
/// # Example
///
/// ```
/// use display_hal::{HalDisplay, ImageSource, Rect, RefreshMode};
/// use panel::mocks::MockPanel;
///
/// let mut display = HalDisplay::new(MockPanel::new());
/// display.begin()?;
/// display.clear_screen(0xFF)?;
/// display.draw_image(&[0u8; 8], Rect::new(0, 0, 8, 8), ImageSource::Ram)?;
/// display.refresh_display(RefreshMode::Fast, true)?;
/// # Ok::<(), display_hal::HalError<panel::mocks::MockPanelError>>(())
/// ```
pub struct HalDisplay<D: PanelDriver> {
    driver: D,
    config: HalConfig,
    frame: Option<FrameBuffer<'static>>,
    power: PowerController,
    refresh: RefreshOrchestrator,
    grayscale: GrayscaleCompositor,
}

impl<D: PanelDriver> HalDisplay<D> {
    /// Wrap `driver` with the default configuration. Nothing touches the
    /// panel until [`begin`](Self::begin).
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, HalConfig::default())
    }

    /// Wrap `driver` with `config`.
    pub fn with_config(driver: D, config: HalConfig) -> Self {
        Self {
            driver,
            config,
            frame: None,
            power: PowerController::new(),
            refresh: RefreshOrchestrator::new(config.full_refresh_budget),
            grayscale: GrayscaleCompositor::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Initialise the panel and take ownership of its frame buffer.
    ///
    /// Fails with `AlreadyInitialized` on a second call, with
    /// `BufferUnavailable` if the driver has no buffer left, and with
    /// `BufferSizeMismatch` if the driver's allocation is not
    /// [`BUFFER_SIZE`] bytes.
    ///
    /// A size mismatch is permanent: the rejected allocation is not handed
    /// out again, so retrying `begin` fails with `BufferUnavailable`.
    pub fn begin(&mut self) -> Result<(), D> {
        if self.frame.is_some() {
            return Err(HalError::AlreadyInitialized);
        }
        tracing::info!(
            width = DISPLAY_WIDTH,
            height = DISPLAY_HEIGHT,
            "initialising display"
        );

        self.driver.initialize().map_err(panel_error("initialize"))?;

        let bytes = self.driver.allocate_buffer().ok_or_else(|| {
            tracing::warn!("driver has no frame buffer to hand out");
            HalError::BufferUnavailable
        })?;
        let actual = bytes.len();
        let frame = FrameBuffer::new(bytes).map_err(|_| {
            tracing::warn!(expected = BUFFER_SIZE, actual, "driver buffer has wrong size");
            HalError::BufferSizeMismatch {
                expected: BUFFER_SIZE,
                actual,
            }
        })?;

        self.frame = Some(frame);
        self.power = PowerController::new();
        tracing::debug!("display initialised");
        Ok(())
    }

    /// Whether [`begin`](Self::begin) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.frame.is_some()
    }

    /// Power state, `None` before [`begin`](Self::begin).
    pub fn power_state(&self) -> Option<PowerState> {
        self.frame.as_ref().map(|_| self.power.state())
    }

    /// Put the panel into deep sleep. A no-op when already sleeping.
    pub fn deep_sleep(&mut self) -> Result<(), D> {
        if self.frame.is_none() {
            return Err(HalError::NotInitialized);
        }
        if self
            .power
            .sleep(&mut self.driver)
            .map_err(panel_error("enter_deep_sleep"))?
        {
            tracing::info!("panel entered deep sleep");
        } else {
            tracing::debug!("panel already asleep");
        }
        Ok(())
    }

    /// Wake the panel by re-running driver initialisation. A no-op when active.
    pub fn wake(&mut self) -> Result<(), D> {
        if self.frame.is_none() {
            return Err(HalError::NotInitialized);
        }
        if self
            .power
            .wake(&mut self.driver)
            .map_err(panel_error("initialize"))?
        {
            tracing::info!("panel woke from deep sleep");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Frame buffer
    // -----------------------------------------------------------------------

    /// The frame buffer, for drawing through `embedded-graphics`.
    pub fn frame_buffer(&self) -> Result<&FrameBuffer<'static>, D> {
        self.frame.as_ref().ok_or(HalError::NotInitialized)
    }

    /// Mutable frame buffer, for drawing through `embedded-graphics`.
    pub fn frame_buffer_mut(&mut self) -> Result<&mut FrameBuffer<'static>, D> {
        self.frame.as_mut().ok_or(HalError::NotInitialized)
    }

    /// Raw frame buffer bytes.
    pub fn buffer(&self) -> Result<&[u8], D> {
        Ok(self.frame_buffer()?.as_bytes())
    }

    /// Mutable raw frame buffer bytes.
    pub fn buffer_mut(&mut self) -> Result<&mut [u8], D> {
        Ok(self.frame_buffer_mut()?.as_bytes_mut())
    }

    /// Fill the frame buffer with `color` (`0xFF` white, `0x00` black).
    ///
    /// Buffer only; allowed while the panel sleeps.
    pub fn clear_screen(&mut self, color: u8) -> Result<(), D> {
        self.frame_buffer_mut()?.clear(color);
        Ok(())
    }

    /// Fill the frame buffer with white.
    pub fn clear_screen_white(&mut self) -> Result<(), D> {
        self.clear_screen(WHITE)
    }

    /// Blit a packed 1bpp image into `rect`. See [`FrameBuffer::draw_image`].
    pub fn draw_image(&mut self, data: &[u8], rect: Rect, source: ImageSource) -> Result<(), D> {
        self.frame_buffer_mut()?.draw_image(data, rect, source)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    /// Push the frame buffer with `mode`'s waveform and wait until latched.
    pub fn display_buffer(&mut self, mode: RefreshMode) -> Result<(), D> {
        self.ensure_active()?;
        if self.grayscale.is_pending() {
            return Err(HalError::GrayscaleCleanupPending);
        }
        let Self {
            driver,
            frame,
            refresh,
            ..
        } = self;
        let frame = frame.as_ref().ok_or(HalError::NotInitialized)?;

        tracing::debug!(mode = mode.name(), "refreshing display");
        refresh
            .run(driver, frame.as_bytes(), mode)
            .map_err(panel_error("transfer"))?;

        if refresh.needs_full_refresh() && mode != RefreshMode::Full {
            tracing::debug!(
                since_full = refresh.stats().since_full,
                "full refresh advised"
            );
        }
        Ok(())
    }

    /// [`display_buffer`](Self::display_buffer), then deep sleep if
    /// `turn_off_screen`. Sleep is only requested after a successful refresh.
    pub fn refresh_display(&mut self, mode: RefreshMode, turn_off_screen: bool) -> Result<(), D> {
        self.display_buffer(mode)?;
        if turn_off_screen {
            self.deep_sleep()?;
        }
        Ok(())
    }

    /// Refresh counters.
    pub fn refresh_stats(&self) -> RefreshStats {
        self.refresh.stats()
    }

    /// Whether enough ghosting refreshes accumulated to advise a Full one.
    pub fn needs_full_refresh(&self) -> bool {
        self.refresh.needs_full_refresh()
    }

    // -----------------------------------------------------------------------
    // Grayscale
    // -----------------------------------------------------------------------

    /// Stage both planes: LSB then MSB.
    pub fn copy_grayscale_buffers(&mut self, lsb: &[u8], msb: &[u8]) -> Result<(), D> {
        self.copy_grayscale_lsb_buffers(lsb)?;
        self.copy_grayscale_msb_buffers(msb)
    }

    /// Stage the LSB plane, then copy it into the frame buffer.
    pub fn copy_grayscale_lsb_buffers(&mut self, lsb: &[u8]) -> Result<(), D> {
        self.copy_grayscale_plane(GrayPlane::Lsb, lsb)
    }

    /// Stage the MSB plane, then copy it into the frame buffer.
    pub fn copy_grayscale_msb_buffers(&mut self, msb: &[u8]) -> Result<(), D> {
        self.copy_grayscale_plane(GrayPlane::Msb, msb)
    }

    /// Stage the frame buffer's current contents as `plane`.
    ///
    /// For renderers that draw each plane straight into the frame buffer.
    pub fn stage_grayscale_plane(&mut self, plane: GrayPlane) -> Result<(), D> {
        self.ensure_active()?;
        let frame = self.frame.as_ref().ok_or(HalError::NotInitialized)?;
        tracing::debug!(?plane, "staging grayscale plane from frame buffer");
        self.driver
            .write_plane(plane.ram_plane(), frame.as_bytes())
            .map_err(panel_error("write_plane"))?;
        self.grayscale.mark_buffer_dirty();
        self.grayscale.mark_staged(plane);
        Ok(())
    }

    // The frame buffer only takes the plane once the controller RAM has it,
    // so a driver failure leaves the buffer and the cycle untouched.
    fn copy_grayscale_plane(&mut self, plane: GrayPlane, data: &[u8]) -> Result<(), D> {
        self.ensure_active()?;
        check_frame_len(data.len())?;
        tracing::debug!(?plane, "staging grayscale plane");
        self.driver
            .write_plane(plane.ram_plane(), data)
            .map_err(panel_error("write_plane"))?;
        self.frame_buffer_mut()?.copy_from(data)?;
        self.grayscale.mark_buffer_dirty();
        self.grayscale.mark_staged(plane);
        Ok(())
    }

    /// Run the grayscale pass plan over the staged planes.
    ///
    /// Both planes must have been staged since the last cleanup. Call one of
    /// the cleanup operations afterwards before any mono refresh.
    pub fn display_grayscale_buffer(&mut self) -> Result<(), D> {
        self.ensure_active()?;
        for pass in compose() {
            match pass {
                GrayscalePass::Stage(plane) => {
                    if !self.grayscale.is_staged(plane) {
                        return Err(HalError::GrayscaleIncomplete {
                            lsb: self.grayscale.is_staged(GrayPlane::Lsb),
                            msb: self.grayscale.is_staged(GrayPlane::Msb),
                        });
                    }
                }
                GrayscalePass::Activate(waveform) => {
                    tracing::debug!(waveform = waveform.name(), "displaying grayscale");
                    self.driver
                        .activate(waveform)
                        .map_err(panel_error("activate"))?;
                    self.grayscale.mark_displayed();
                    self.refresh.record(waveform);
                }
            }
        }
        Ok(())
    }

    /// Rewrite both RAM planes with `prior_mono`, then restore the frame
    /// buffer from it, ending the grayscale cycle.
    ///
    /// On a driver failure the frame buffer and the pending cycle are left
    /// as they were, so cleanup can be retried.
    pub fn cleanup_grayscale_buffers(&mut self, prior_mono: &[u8]) -> Result<(), D> {
        self.ensure_active()?;
        check_frame_len(prior_mono.len())?;
        tracing::debug!("restoring mono frame to both RAM planes");
        write_mono_planes(&mut self.driver, prior_mono).map_err(panel_error("write_plane"))?;
        self.frame_buffer_mut()?.copy_from(prior_mono)?;
        self.grayscale.reset();
        Ok(())
    }

    /// Save the frame buffer into caller-owned `chunks` (at most four).
    pub fn capture_mono_snapshot<'s, I>(&self, chunks: I) -> Result<MonoSnapshot<'s>, D>
    where
        I: IntoIterator<Item = &'s mut [u8]>,
    {
        Ok(MonoSnapshot::capture(self.frame_buffer()?, chunks)?)
    }

    /// [`cleanup_grayscale_buffers`](Self::cleanup_grayscale_buffers) from a
    /// chunked snapshot.
    ///
    /// The snapshot holds the same frame afterwards. On a driver failure the
    /// frame buffer, the snapshot and the pending cycle are left as they were.
    pub fn restore_mono_snapshot(&mut self, snapshot: &mut MonoSnapshot<'_>) -> Result<(), D> {
        self.ensure_active()?;
        let Self {
            driver,
            frame,
            grayscale,
            ..
        } = self;
        let frame = frame.as_mut().ok_or(HalError::NotInitialized)?;

        tracing::debug!(
            chunks = snapshot.chunk_count(),
            "restoring mono snapshot to both RAM planes"
        );
        // The planes need one contiguous frame, so borrow the frame buffer
        // for the write and park its grayscale contents in the snapshot.
        snapshot.swap_with(frame);
        if let Err(error) = write_mono_planes(driver, frame.as_bytes()) {
            snapshot.swap_with(frame);
            return Err(panel_error("write_plane")(error));
        }
        snapshot.fill(frame.as_bytes());
        grayscale.reset();
        Ok(())
    }

    /// Whether a grayscale cycle awaits cleanup.
    pub fn is_grayscale_pending(&self) -> bool {
        self.grayscale.is_pending()
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Active configuration.
    pub fn config(&self) -> HalConfig {
        self.config
    }

    /// The underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The underlying driver, mutably.
    ///
    /// Bypassing the HAL leaves its power and grayscale bookkeeping stale.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Consume the HAL and return the driver.
    pub fn into_driver(self) -> D {
        self.driver
    }

    fn ensure_active(&self) -> Result<(), D> {
        if self.frame.is_none() {
            return Err(HalError::NotInitialized);
        }
        if !self.power.is_active() {
            return Err(HalError::PanelAsleep);
        }
        Ok(())
    }
}
