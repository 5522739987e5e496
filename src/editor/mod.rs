//! Interactive analysis session: one active tool, cross-tool cancellation,
//! overlay rendering.

pub mod animation;
mod events;
mod palette;
mod render;
pub mod tools;

use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::geometry::{CoordinateMapper, ImageBounds, PointF, ToolPoint};
use crate::input::{
    resolve_shortcut, CursorShape, InputContext, InputResponse, PointerButton, ShortcutAction,
    ShortcutKey, ShortcutModifiers,
};
use crate::state::{EditMode, ModeEvent, ModeMachine, ModeTransition, StateResult};

use animation::{AnimationClock, ANIMATION_INTERVAL};
pub use events::{Notice, RecordingObserver, SessionEvent, SessionObserver};
pub use palette::{average_brightness, overlay_color, BRIGHTNESS_THRESHOLD};
pub use render::{OverlayCommand, CROSS_HALF_SIZE, LABEL_FONT_SIZE};
use tools::{
    DistanceMeasure, DistanceTool, FloodFillSelector, GrowError, LengthUnit, LineDetectionOptions,
    LineDetector, LineLayer, ProjectionLineDetector, RegionSelector, Resolution,
    DEFAULT_TOLERANCE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSettings {
    pub default_tolerance: u8,
    pub length_unit: LengthUnit,
    pub animation_interval: Duration,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_tolerance: DEFAULT_TOLERANCE,
            length_unit: LengthUnit::default(),
            animation_interval: ANIMATION_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct LineVisibility {
    bottom: bool,
    top: bool,
}

impl LineVisibility {
    fn get(self, layer: LineLayer) -> bool {
        match layer {
            LineLayer::Bottom => self.bottom,
            LineLayer::Top => self.top,
        }
    }

    fn set(&mut self, layer: LineLayer, visible: bool) {
        match layer {
            LineLayer::Bottom => self.bottom = visible,
            LineLayer::Top => self.top = visible,
        }
    }
}

/// Owns the edit mode and routes input to the tool that mode selects.
pub struct ToolCoordinator {
    selector: Box<dyn RegionSelector>,
    distance: Box<dyn DistanceTool>,
    lines: Box<dyn LineDetector>,
    observer: Box<dyn SessionObserver>,
    modes: ModeMachine,
    mapper: CoordinateMapper,
    image_bounds: Option<ImageBounds>,
    brightness: f64,
    settings: EditorSettings,
    clock: AnimationClock,
    line_visibility: LineVisibility,
    lines_available: bool,
    pointer_inside: bool,
    dialog_open: bool,
    cursor: CursorShape,
}

impl ToolCoordinator {
    pub fn new(
        mut selector: Box<dyn RegionSelector>,
        distance: Box<dyn DistanceTool>,
        lines: Box<dyn LineDetector>,
        observer: Box<dyn SessionObserver>,
        settings: EditorSettings,
    ) -> Self {
        selector.set_tolerance(settings.default_tolerance);
        Self {
            selector,
            distance,
            lines,
            observer,
            modes: ModeMachine::new(),
            mapper: CoordinateMapper::identity(),
            image_bounds: None,
            brightness: 1.0,
            settings,
            clock: AnimationClock::new(settings.animation_interval),
            line_visibility: LineVisibility::default(),
            lines_available: false,
            pointer_inside: false,
            dialog_open: false,
            cursor: CursorShape::Default,
        }
    }

    /// Session wired with the built-in flood fill, measurement and projection
    /// line detector.
    pub fn with_default_tools(
        observer: Box<dyn SessionObserver>,
        settings: EditorSettings,
    ) -> Self {
        Self::new(
            Box::new(FloodFillSelector::new()),
            Box::new(DistanceMeasure::new()),
            Box::new(ProjectionLineDetector::new()),
            observer,
            settings,
        )
    }

    pub fn edit_mode(&self) -> EditMode {
        self.modes.mode()
    }

    pub fn mode_history(&self) -> &[ModeTransition] {
        self.modes.history()
    }

    pub fn has_image(&self) -> bool {
        self.image_bounds.is_some()
    }

    pub fn has_contours(&self) -> bool {
        self.selector.has_contours()
    }

    pub fn tolerance(&self) -> u8 {
        self.selector.tolerance()
    }

    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    pub fn settings(&self) -> EditorSettings {
        self.settings
    }

    pub fn cursor(&self) -> CursorShape {
        self.cursor
    }

    pub fn distance(&self) -> &dyn DistanceTool {
        self.distance.as_ref()
    }

    pub fn lines_available(&self) -> bool {
        self.lines_available
    }

    pub fn is_line_layer_visible(&self, layer: LineLayer) -> bool {
        self.line_visibility.get(layer)
    }

    pub fn line_overlay(&self, layer: LineLayer) -> Option<&RgbaImage> {
        match layer {
            LineLayer::Bottom => self.lines.bottom_lines_overlay(),
            LineLayer::Top => self.lines.top_lines_overlay(),
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        self.observer.notify(event);
    }

    fn request_repaint(&mut self) {
        self.emit(SessionEvent::RepaintRequested);
    }

    fn notice(&mut self, notice: Notice) {
        tracing::info!(?notice, "user notice");
        self.emit(SessionEvent::Notice(notice));
    }

    /// Binds a new image. Selection, measurement and text lines of the previous
    /// image are discarded; the active mode is kept.
    pub fn bind_image(
        &mut self,
        image: &RgbaImage,
        resolution: Option<Resolution>,
        view: CoordinateMapper,
    ) {
        let bounds = ImageBounds::of_image(image);
        self.mapper = view;
        self.image_bounds = Some(bounds);
        self.selector.set_image(image, &view);
        self.lines.set_image(image);
        self.distance.reset();
        self.distance.bind_resolution(resolution);
        self.brightness = average_brightness(image);
        tracing::debug!(
            width = bounds.width,
            height = bounds.height,
            brightness = self.brightness,
            resolution = ?self.distance.resolution(),
            "image bound to analysis session"
        );

        if self.distance.resolution().is_none() {
            tracing::warn!("image has no usable resolution metadata");
            self.notice(Notice::MissingResolution);
        }

        self.emit(SessionEvent::SelectionAvailabilityChanged(false));
        self.lines_available = false;
        self.emit(SessionEvent::TextLinesAvailable(false));
        for layer in LineLayer::ALL {
            self.set_line_visibility(layer, false);
        }
        self.request_repaint();
    }

    pub fn set_view(&mut self, view: CoordinateMapper) {
        self.mapper = view;
        self.selector.set_view(&view);
        self.request_repaint();
    }

    pub fn set_dialog_open(&mut self, open: bool) {
        self.dialog_open = open;
    }

    /// Ends the session's active tool; the session is back in `Default`.
    pub fn close(&mut self) {
        self.cancel_mode();
        self.pointer_inside = false;
        self.update_cursor();
    }

    pub fn enter_mode(&mut self, mode: EditMode) -> StateResult<ModeTransition> {
        self.apply_event(ModeEvent::Enter(mode))
    }

    /// Toolbar toggle: switches `mode` off when it is active, on otherwise.
    pub fn toggle_mode(&mut self, mode: EditMode) -> StateResult<ModeTransition> {
        if self.modes.mode() == mode {
            self.apply_event(ModeEvent::ToggleOff(mode))
        } else {
            self.apply_event(ModeEvent::Enter(mode))
        }
    }

    pub fn cancel_mode(&mut self) -> ModeTransition {
        let from = self.modes.mode();
        self.apply_event(ModeEvent::Cancel)
            .unwrap_or_else(|_| ModeTransition::new(from, ModeEvent::Cancel, from, None))
    }

    fn apply_event(&mut self, event: ModeEvent) -> StateResult<ModeTransition> {
        let transition = self.modes.next_transition(event).inspect_err(|err| {
            tracing::warn!(%err, "mode request rejected");
        })?;
        if transition.is_noop() {
            return Ok(transition);
        }

        // Teardown of the vacated tool completes before the new mode is live.
        if let Some(vacated) = transition.cancelled {
            self.teardown(vacated);
            self.emit(SessionEvent::ModeCancelled(vacated));
        }
        self.modes.commit(transition)?;

        match event {
            ModeEvent::Enter(mode) => {
                self.setup(mode);
                self.emit(SessionEvent::ModeEntered(mode));
            }
            ModeEvent::ToggleOff(mode) => {
                self.teardown(mode);
                self.emit(SessionEvent::ModeExited(mode));
            }
            ModeEvent::Cancel => {}
        }
        self.update_cursor();
        self.request_repaint();
        Ok(transition)
    }

    fn setup(&mut self, mode: EditMode) {
        if mode == EditMode::PickDistance {
            self.distance.reset();
        }
    }

    fn teardown(&mut self, mode: EditMode) {
        if mode == EditMode::PickDistance {
            self.distance.reset();
            self.distance.set_snap(false);
        }
    }

    fn update_cursor(&mut self) {
        let shape = match self.modes.mode() {
            EditMode::Default => CursorShape::Default,
            EditMode::PickSeedpoint | EditMode::CancelSeedpoint => CursorShape::PointingHand,
            EditMode::PickDistance
                if self.pointer_inside && self.distance.has_start() && !self.distance.has_both() =>
            {
                CursorShape::Blank
            }
            EditMode::PickDistance => CursorShape::Cross,
        };
        if shape != self.cursor {
            self.cursor = shape;
            self.emit(SessionEvent::CursorChanged(shape));
        }
    }

    fn image_pixel(&self, display: PointF) -> Option<ToolPoint> {
        let bounds = self.image_bounds?;
        self.mapper
            .to_image(display)
            .filter(|point| bounds.contains(*point))
            .map(PointF::to_pixel)
    }

    pub fn pointer_moved(&mut self, display: PointF) -> InputResponse {
        let mode = self.modes.mode();
        if !mode.is_tool() {
            return InputResponse::Ignored;
        }

        let pixel = self.image_pixel(display);
        self.pointer_inside = pixel.is_some();
        if let (EditMode::PickDistance, Some(pixel)) = (mode, pixel) {
            self.distance.set_provisional_point(pixel);
            self.request_repaint();
        }
        self.update_cursor();
        InputResponse::Consumed
    }

    pub fn pointer_released(&mut self, display: PointF, button: PointerButton) -> InputResponse {
        let mode = self.modes.mode();
        if !mode.is_tool() || button != PointerButton::Primary {
            return InputResponse::Ignored;
        }
        let Some(pixel) = self.image_pixel(display) else {
            return InputResponse::Ignored;
        };

        match mode {
            EditMode::PickSeedpoint => {
                match self.selector.grow(pixel) {
                    Ok(()) => {}
                    Err(GrowError::AreaTooLarge { area, limit }) => {
                        tracing::debug!(seed = ?pixel, area, limit, "seed rejected");
                        self.notice(Notice::SelectionTooLarge);
                    }
                    Err(err) => tracing::warn!(%err, seed = ?pixel, "region growing failed"),
                }
                let available = self.selector.has_contours();
                self.emit(SessionEvent::SelectionAvailabilityChanged(available));
            }
            EditMode::CancelSeedpoint => {
                let removed = self.selector.subtract_at(pixel);
                tracing::debug!(pixel = ?pixel, removed, "cancel seed");
                let available = self.selector.has_contours();
                self.emit(SessionEvent::SelectionAvailabilityChanged(available));
            }
            EditMode::PickDistance => {
                if self.distance.has_both() {
                    self.distance.reset();
                }
                self.distance.commit_point(pixel);
                self.update_cursor();
            }
            EditMode::Default => {}
        }
        self.request_repaint();
        InputResponse::Consumed
    }

    pub fn double_clicked(&mut self) -> InputResponse {
        if self.modes.is_editing() || self.selector.has_contours() {
            InputResponse::Consumed
        } else {
            InputResponse::Ignored
        }
    }

    pub fn key_pressed(
        &mut self,
        key: ShortcutKey,
        modifiers: ShortcutModifiers,
        is_auto_repeat: bool,
    ) -> InputResponse {
        let context = InputContext {
            dialog_open: self.dialog_open,
            mode: self.modes.mode(),
            is_auto_repeat,
        };
        match resolve_shortcut(key, modifiers, context) {
            Some(action) => self.apply_shortcut(action),
            None => InputResponse::Ignored,
        }
    }

    /// Any key release ends snapping.
    pub fn key_released(&mut self, _key: ShortcutKey) -> InputResponse {
        if !self.distance.is_snapping() {
            return InputResponse::Ignored;
        }
        self.distance.set_snap(false);
        self.request_repaint();
        InputResponse::Consumed
    }

    pub fn apply_shortcut(&mut self, action: ShortcutAction) -> InputResponse {
        tracing::debug!(?action, mode = ?self.modes.mode(), "shortcut");
        let mode_result = match action {
            ShortcutAction::CancelMode => {
                self.cancel_mode();
                Ok(())
            }
            ShortcutAction::SaveCut => {
                return if self.request_save_cut() {
                    InputResponse::Consumed
                } else {
                    InputResponse::Ignored
                };
            }
            ShortcutAction::EnableSnapping => {
                self.distance.set_snap(true);
                self.request_repaint();
                Ok(())
            }
            ShortcutAction::ToggleDistance => self.toggle_mode(EditMode::PickDistance).map(drop),
            ShortcutAction::ToggleSeedpoint => self.toggle_mode(EditMode::PickSeedpoint).map(drop),
            ShortcutAction::ToggleCancelSeedpoint => {
                self.toggle_mode(EditMode::CancelSeedpoint).map(drop)
            }
            ShortcutAction::UndoSelection => {
                self.undo_selection();
                Ok(())
            }
            ShortcutAction::ClearSelection => {
                self.clear_selection();
                Ok(())
            }
            ShortcutAction::ToggleBottomLines => {
                self.toggle_bottom_text_lines();
                Ok(())
            }
            ShortcutAction::ToggleTopLines => {
                self.toggle_top_text_lines();
                Ok(())
            }
            ShortcutAction::DetectTextLines => return InputResponse::Delegated(action),
        };
        match mode_result {
            Ok(()) => InputResponse::Consumed,
            Err(_) => InputResponse::Ignored,
        }
    }

    pub fn set_tolerance(&mut self, tolerance: u8) {
        self.selector.set_tolerance(tolerance);
    }

    pub fn undo_selection(&mut self) {
        if !self.selector.has_contours() {
            return;
        }
        let remaining = self.selector.undo_last();
        self.emit(SessionEvent::SelectionAvailabilityChanged(remaining));
        self.request_repaint();
    }

    pub fn clear_selection(&mut self) {
        self.selector.clear_all();
        self.emit(SessionEvent::SelectionAvailabilityChanged(false));
        self.request_repaint();
    }

    /// Emits the save request for the current selection. Returns false when
    /// there is nothing to save.
    pub fn request_save_cut(&mut self) -> bool {
        if self.image_bounds.is_none() || !self.selector.has_contours() {
            tracing::debug!("save requested without a selection");
            return false;
        }
        let Some(cut) = self.selector.extract_cut() else {
            return false;
        };
        tracing::debug!(bounds = ?cut.bounds, "selection save requested");
        self.emit(SessionEvent::SaveCutRequested(cut));
        true
    }

    /// Outcome of the host's save. Success clears the selection; failure keeps
    /// the session as it was.
    pub fn cut_saved(&mut self, saved: bool) {
        if saved {
            self.clear_selection();
        } else {
            tracing::warn!("selection cut could not be saved");
            self.notice(Notice::CutSaveFailed);
        }
    }

    /// Runs line detection on the bound image; when lines are found the bottom
    /// layer is shown.
    pub fn detect_text_lines(&mut self, options: &LineDetectionOptions) -> usize {
        if self.image_bounds.is_none() {
            self.notice(Notice::MissingImage);
            return 0;
        }
        let count = self.lines.detect(options);
        self.lines_available = self.lines.has_detected_lines();
        self.emit(SessionEvent::TextLinesAvailable(self.lines_available));
        if self.lines_available {
            self.show_bottom_text_lines(true);
        } else {
            for layer in LineLayer::ALL {
                self.set_line_visibility(layer, false);
            }
        }
        count
    }

    fn set_line_visibility(&mut self, layer: LineLayer, visible: bool) {
        let visible = visible && self.lines_available;
        self.line_visibility.set(layer, visible);
        self.emit(SessionEvent::TextLinesVisibilityChanged { layer, visible });
        self.request_repaint();
    }

    pub fn show_bottom_text_lines(&mut self, visible: bool) {
        self.set_line_visibility(LineLayer::Bottom, visible);
    }

    pub fn show_top_text_lines(&mut self, visible: bool) {
        self.set_line_visibility(LineLayer::Top, visible);
    }

    pub fn toggle_bottom_text_lines(&mut self) {
        self.show_bottom_text_lines(!self.line_visibility.bottom);
    }

    pub fn toggle_top_text_lines(&mut self) {
        self.show_top_text_lines(!self.line_visibility.top);
    }

    pub fn animation_tick(&mut self) {
        self.selector.advance_animation();
        self.request_repaint();
    }

    /// Polled from the host loop; returns whether an animation step ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.clock.poll(now) {
            self.animation_tick();
            true
        } else {
            false
        }
    }

    pub fn render(&self) -> Vec<OverlayCommand<'_>> {
        let transform = self.mapper.view_transform();
        let color = overlay_color(self.brightness);
        let mut commands = Vec::new();

        for layer in LineLayer::ALL {
            if !self.line_visibility.get(layer) {
                continue;
            }
            if let Some(image) = self.line_overlay(layer) {
                commands.push(OverlayCommand::LineLayer {
                    layer,
                    image,
                    transform,
                });
            }
        }

        if self.selector.has_contours() {
            let mut style = self.selector.contour_style();
            style.color = color;
            commands.push(OverlayCommand::Contours {
                paths: self.selector.contour_paths(),
                style,
                transform,
            });
        }

        if self.modes.mode() == EditMode::PickDistance {
            commands.extend(render::measurement_commands(
                self.distance.as_ref(),
                &self.mapper,
                self.settings.length_unit,
                color,
            ));
        }
        commands
    }
}

impl std::fmt::Debug for ToolCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCoordinator")
            .field("mode", &self.modes.mode())
            .field("image_bounds", &self.image_bounds)
            .field("has_contours", &self.selector.has_contours())
            .field("brightness", &self.brightness)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Affine, Color, ToolBounds};
    use image::Rgba;
    use super::tools::ContourPath;

    const PATCH: Rgba<u8> = Rgba([30, 30, 30, 255]);
    const PAPER: Rgba<u8> = Rgba([245, 245, 245, 255]);

    /// 1000x800 page with a dark patch around (100, 100) and a second one
    /// further right.
    fn scenario_image() -> RgbaImage {
        let mut image = RgbaImage::from_pixel(1000, 800, PAPER);
        for y in 50..150 {
            for x in 50..200 {
                image.put_pixel(x, y, PATCH);
            }
        }
        for y in 400..450 {
            for x in 600..700 {
                image.put_pixel(x, y, PATCH);
            }
        }
        image
    }

    fn session() -> (ToolCoordinator, RecordingObserver) {
        let observer = RecordingObserver::new();
        let mut coordinator =
            ToolCoordinator::with_default_tools(Box::new(observer.clone()), EditorSettings::default());
        coordinator.bind_image(
            &scenario_image(),
            Some(Resolution::per_centimeter(100.0)),
            CoordinateMapper::identity(),
        );
        observer.take();
        (coordinator, observer)
    }

    fn click(coordinator: &mut ToolCoordinator, x: f64, y: f64) -> InputResponse {
        coordinator.pointer_released(PointF::new(x, y), PointerButton::Primary)
    }

    fn rendered_contours(coordinator: &ToolCoordinator) -> Option<Vec<ContourPath>> {
        coordinator
            .render()
            .into_iter()
            .find_map(|command| match command {
                OverlayCommand::Contours { paths, .. } => Some(paths),
                _ => None,
            })
    }

    fn availability(events: &[SessionEvent]) -> Vec<bool> {
        events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::SelectionAvailabilityChanged(available) => Some(*available),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn seed_then_cancel_seed_round_trips_selection() {
        let (mut coordinator, observer) = session();
        assert_eq!(coordinator.tolerance(), 40);

        coordinator.enter_mode(EditMode::PickSeedpoint).unwrap();
        assert!(click(&mut coordinator, 100.0, 100.0).is_consumed());
        assert!(coordinator.has_contours());

        let transition = coordinator.enter_mode(EditMode::CancelSeedpoint).unwrap();
        assert_eq!(transition.cancelled, Some(EditMode::PickSeedpoint));
        click(&mut coordinator, 100.0, 100.0);
        assert!(!coordinator.has_contours());

        let events = observer.take();
        assert_eq!(availability(&events), vec![true, false]);
        assert!(events.contains(&SessionEvent::ModeCancelled(EditMode::PickSeedpoint)));
        assert!(events.contains(&SessionEvent::ModeEntered(EditMode::CancelSeedpoint)));
    }

    #[test]
    fn oversized_seed_is_reported_and_keeps_prior_selection() {
        let (mut coordinator, observer) = session();
        coordinator.enter_mode(EditMode::PickSeedpoint).unwrap();
        click(&mut coordinator, 100.0, 100.0);
        let before = rendered_contours(&coordinator);
        assert!(before.is_some());

        click(&mut coordinator, 900.0, 700.0);
        let events = observer.take();
        assert!(events.contains(&SessionEvent::Notice(Notice::SelectionTooLarge)));
        assert_eq!(availability(&events), vec![true, true]);
        assert_eq!(coordinator.edit_mode(), EditMode::PickSeedpoint);
        assert_eq!(rendered_contours(&coordinator), before);
    }

    #[test]
    fn distance_between_two_clicks_in_physical_units() {
        let (mut coordinator, observer) = session();
        coordinator.enter_mode(EditMode::PickDistance).unwrap();
        assert_eq!(coordinator.cursor(), CursorShape::Cross);

        click(&mut coordinator, 10.5, 10.5);
        coordinator.pointer_moved(PointF::new(60.0, 10.0));
        assert_eq!(coordinator.cursor(), CursorShape::Blank);
        click(&mut coordinator, 110.5, 10.5);

        let measured = coordinator.distance().distance_in_physical_units().unwrap();
        assert_eq!(format!("{measured:.2}"), "1.00");
        let commands = coordinator.render();
        assert!(commands.iter().any(|command| matches!(
            command,
            OverlayCommand::Label { text, .. } if text == "1.00 cm"
        )));
        assert!(observer.events().contains(&SessionEvent::CursorChanged(CursorShape::Blank)));
    }

    #[test]
    fn third_distance_click_starts_new_measurement() {
        let (mut coordinator, _observer) = session();
        coordinator.enter_mode(EditMode::PickDistance).unwrap();
        click(&mut coordinator, 10.0, 10.0);
        click(&mut coordinator, 20.0, 10.0);
        click(&mut coordinator, 30.0, 30.0);

        assert!(coordinator.distance().has_start());
        assert!(!coordinator.distance().has_both());
        assert_eq!(coordinator.distance().start_point(), Some(ToolPoint::new(30, 30)));
    }

    #[test]
    fn leaving_distance_mode_resets_measurement() {
        let (mut coordinator, observer) = session();
        coordinator.enter_mode(EditMode::PickDistance).unwrap();
        click(&mut coordinator, 10.0, 10.0);
        click(&mut coordinator, 20.0, 10.0);

        coordinator.enter_mode(EditMode::PickSeedpoint).unwrap();
        assert!(!coordinator.distance().has_start());
        assert!(observer
            .events()
            .contains(&SessionEvent::ModeCancelled(EditMode::PickDistance)));
        assert!(!coordinator
            .render()
            .iter()
            .any(|command| matches!(command, OverlayCommand::Label { .. })));
    }

    #[test]
    fn escape_cancels_active_mode_and_default_ignores_it() {
        let (mut coordinator, observer) = session();
        assert_eq!(
            coordinator.key_pressed(ShortcutKey::Escape, ShortcutModifiers::default(), false),
            InputResponse::Ignored
        );

        coordinator.enter_mode(EditMode::CancelSeedpoint).unwrap();
        let response =
            coordinator.key_pressed(ShortcutKey::Escape, ShortcutModifiers::default(), false);
        assert!(response.is_consumed());
        assert_eq!(coordinator.edit_mode(), EditMode::Default);
        assert!(observer
            .events()
            .contains(&SessionEvent::ModeCancelled(EditMode::CancelSeedpoint)));
    }

    #[test]
    fn toolbar_toggle_off_exits_without_cancellation() {
        let (mut coordinator, observer) = session();
        coordinator
            .key_pressed(ShortcutKey::Character('S'), ShortcutModifiers::shift(), false);
        assert_eq!(coordinator.edit_mode(), EditMode::PickSeedpoint);
        coordinator
            .key_pressed(ShortcutKey::Character('S'), ShortcutModifiers::shift(), false);
        assert_eq!(coordinator.edit_mode(), EditMode::Default);

        let events = observer.take();
        assert!(events.contains(&SessionEvent::ModeExited(EditMode::PickSeedpoint)));
        assert!(!events
            .iter()
            .any(|event| matches!(event, SessionEvent::ModeCancelled(_))));
    }

    #[test]
    fn shift_snaps_until_key_release() {
        let (mut coordinator, _observer) = session();
        coordinator.enter_mode(EditMode::PickDistance).unwrap();
        click(&mut coordinator, 10.0, 10.0);
        coordinator.pointer_moved(PointF::new(110.0, 14.0));

        coordinator.key_pressed(ShortcutKey::Shift, ShortcutModifiers::shift(), false);
        assert_eq!(coordinator.distance().current_point(), Some(ToolPoint::new(110, 10)));

        assert!(coordinator.key_released(ShortcutKey::Shift).is_consumed());
        assert_eq!(coordinator.distance().current_point(), Some(ToolPoint::new(110, 14)));
        assert_eq!(coordinator.key_released(ShortcutKey::Shift), InputResponse::Ignored);
    }

    #[test]
    fn pointer_outside_image_does_not_touch_measurement() {
        let (mut coordinator, _observer) = session();
        coordinator.enter_mode(EditMode::PickDistance).unwrap();
        click(&mut coordinator, 10.0, 10.0);

        coordinator.pointer_moved(PointF::new(1500.0, 10.0));
        assert_eq!(coordinator.distance().current_point(), None);
        assert_eq!(click(&mut coordinator, -3.0, 10.0), InputResponse::Ignored);
        assert!(!coordinator.distance().has_both());
        assert_eq!(coordinator.cursor(), CursorShape::Cross);
    }

    #[test]
    fn pointer_without_active_tool_passes_through() {
        let (mut coordinator, _observer) = session();
        assert_eq!(coordinator.pointer_moved(PointF::new(5.0, 5.0)), InputResponse::Ignored);
        assert_eq!(click(&mut coordinator, 100.0, 100.0), InputResponse::Ignored);
        assert!(!coordinator.has_contours());
    }

    #[test]
    fn double_click_swallowed_while_editing_or_selected() {
        let (mut coordinator, _observer) = session();
        assert_eq!(coordinator.double_clicked(), InputResponse::Ignored);

        coordinator.enter_mode(EditMode::PickSeedpoint).unwrap();
        assert!(coordinator.double_clicked().is_consumed());
        click(&mut coordinator, 100.0, 100.0);

        coordinator.cancel_mode();
        assert!(coordinator.double_clicked().is_consumed());
    }

    #[test]
    fn undo_reports_empty_only_after_last_region() {
        let (mut coordinator, observer) = session();
        coordinator.set_tolerance(10);
        coordinator.enter_mode(EditMode::PickSeedpoint).unwrap();
        click(&mut coordinator, 100.0, 100.0);
        click(&mut coordinator, 650.0, 420.0);
        observer.take();

        coordinator.undo_selection();
        coordinator.undo_selection();
        coordinator.undo_selection();

        assert_eq!(availability(&observer.take()), vec![true, false]);
        assert_eq!(coordinator.tolerance(), 10);
        assert!(!coordinator.has_contours());
    }

    #[test]
    fn save_request_carries_cut_and_outcome_decides_session() {
        let (mut coordinator, observer) = session();
        assert!(!coordinator.request_save_cut());

        coordinator.enter_mode(EditMode::PickSeedpoint).unwrap();
        click(&mut coordinator, 100.0, 100.0);
        observer.take();

        let response =
            coordinator.key_pressed(ShortcutKey::Enter, ShortcutModifiers::alt(), false);
        assert!(response.is_consumed());
        let events = observer.take();
        let cut = events
            .iter()
            .find_map(|event| match event {
                SessionEvent::SaveCutRequested(cut) => Some(cut.clone()),
                _ => None,
            })
            .expect("save request emitted");
        assert_eq!(cut.bounds, ToolBounds::new(50, 50, 150, 100));

        coordinator.cut_saved(false);
        assert!(coordinator.has_contours());
        assert_eq!(
            observer.take(),
            vec![SessionEvent::Notice(Notice::CutSaveFailed)]
        );

        coordinator.cut_saved(true);
        assert!(!coordinator.has_contours());
        assert_eq!(availability(&observer.take()), vec![false]);
    }

    #[test]
    fn detect_text_lines_shows_bottom_layer() {
        let (mut coordinator, observer) = session();
        let response =
            coordinator.key_pressed(ShortcutKey::Character('d'), ShortcutModifiers::shift(), false);
        assert_eq!(response, InputResponse::Delegated(ShortcutAction::DetectTextLines));

        let count = coordinator.detect_text_lines(&LineDetectionOptions::default());
        assert_eq!(count, 2);
        assert!(coordinator.lines_available());
        assert!(coordinator.is_line_layer_visible(LineLayer::Bottom));
        assert!(!coordinator.is_line_layer_visible(LineLayer::Top));
        let events = observer.take();
        assert!(events.contains(&SessionEvent::TextLinesAvailable(true)));
        assert!(events.contains(&SessionEvent::TextLinesVisibilityChanged {
            layer: LineLayer::Bottom,
            visible: true,
        }));

        coordinator.toggle_top_text_lines();
        coordinator.toggle_bottom_text_lines();
        let layers: Vec<LineLayer> = coordinator
            .render()
            .iter()
            .filter_map(|command| match command {
                OverlayCommand::LineLayer { layer, .. } => Some(*layer),
                _ => None,
            })
            .collect();
        assert_eq!(layers, vec![LineLayer::Top]);
    }

    #[test]
    fn text_lines_stay_hidden_until_detected() {
        let (mut coordinator, _observer) = session();
        coordinator.show_top_text_lines(true);
        assert!(!coordinator.is_line_layer_visible(LineLayer::Top));
    }

    #[test]
    fn binding_image_without_resolution_notifies_once_and_resets_lines() {
        let observer = RecordingObserver::new();
        let mut coordinator =
            ToolCoordinator::with_default_tools(Box::new(observer.clone()), EditorSettings::default());
        coordinator.bind_image(
            &scenario_image(),
            Some(Resolution::per_centimeter(100.0)),
            CoordinateMapper::identity(),
        );
        coordinator.detect_text_lines(&LineDetectionOptions::default());
        observer.take();

        coordinator.bind_image(&scenario_image(), None, CoordinateMapper::identity());
        let events = observer.take();
        let notices = events
            .iter()
            .filter(|event| **event == SessionEvent::Notice(Notice::MissingResolution))
            .count();
        assert_eq!(notices, 1);
        assert!(events.contains(&SessionEvent::TextLinesAvailable(false)));
        assert!(events.contains(&SessionEvent::SelectionAvailabilityChanged(false)));
        assert!(!coordinator.is_line_layer_visible(LineLayer::Bottom));
    }

    #[test]
    fn detect_without_image_emits_notice() {
        let observer = RecordingObserver::new();
        let mut coordinator =
            ToolCoordinator::with_default_tools(Box::new(observer.clone()), EditorSettings::default());
        assert_eq!(coordinator.detect_text_lines(&LineDetectionOptions::default()), 0);
        assert_eq!(observer.events(), vec![SessionEvent::Notice(Notice::MissingImage)]);
    }

    #[test]
    fn dark_images_render_contours_in_high_contrast() {
        let observer = RecordingObserver::new();
        let mut coordinator =
            ToolCoordinator::with_default_tools(Box::new(observer), EditorSettings::default());
        let mut dark = RgbaImage::from_pixel(100, 100, Rgba([10, 10, 10, 255]));
        for y in 10..20 {
            for x in 10..20 {
                dark.put_pixel(x, y, Rgba([200, 200, 200, 255]));
            }
        }
        coordinator.bind_image(&dark, None, CoordinateMapper::identity());
        assert!(coordinator.brightness() < BRIGHTNESS_THRESHOLD);

        coordinator.enter_mode(EditMode::PickSeedpoint).unwrap();
        click(&mut coordinator, 15.0, 15.0);
        let style = coordinator.render().iter().find_map(|command| match command {
            OverlayCommand::Contours { style, .. } => Some(*style),
            _ => None,
        });
        assert_eq!(style.map(|style| style.color), Some(Color::WHITE));
    }

    #[test]
    fn zoomed_view_maps_clicks_to_image_pixels() {
        let (mut coordinator, _observer) = session();
        coordinator.set_view(CoordinateMapper::new(
            Affine::scale_translate(0.5, 0.0, 0.0),
            Affine::scale_translate(2.0, 40.0, 20.0),
        ));
        coordinator.enter_mode(EditMode::PickDistance).unwrap();
        click(&mut coordinator, 50.0, 30.0);
        assert_eq!(coordinator.distance().start_point(), Some(ToolPoint::new(10, 10)));
    }

    #[test]
    fn tick_advances_animation_on_interval_without_touching_selection() {
        let (mut coordinator, observer) = session();
        coordinator.enter_mode(EditMode::PickSeedpoint).unwrap();
        click(&mut coordinator, 100.0, 100.0);
        coordinator.cancel_mode();
        observer.take();

        let start = Instant::now();
        assert!(!coordinator.tick(start));
        assert!(coordinator.tick(start + ANIMATION_INTERVAL));
        assert_eq!(observer.take(), vec![SessionEvent::RepaintRequested]);
        assert!(coordinator.has_contours());
    }

    #[test]
    fn close_returns_to_default() {
        let (mut coordinator, _observer) = session();
        coordinator.enter_mode(EditMode::PickDistance).unwrap();
        coordinator.close();
        assert_eq!(coordinator.edit_mode(), EditMode::Default);
        assert_eq!(coordinator.cursor(), CursorShape::Default);
    }

    #[test]
    fn dialog_blocks_keyboard_shortcuts() {
        let (mut coordinator, _observer) = session();
        coordinator.enter_mode(EditMode::PickSeedpoint).unwrap();
        coordinator.set_dialog_open(true);
        assert_eq!(
            coordinator.key_pressed(ShortcutKey::Escape, ShortcutModifiers::default(), false),
            InputResponse::Ignored
        );
        assert_eq!(coordinator.edit_mode(), EditMode::PickSeedpoint);
    }
}
