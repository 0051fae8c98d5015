//! Tours over a fake native view tree with deferred measurement.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tourkit_backend::TargetRegistry;
use tourkit_core::{Rect, Size, TargetRef, TourStep, TourTarget};
use tourkit_harness::init_test_logging;
use tourkit_native::{MeasureReply, NativeHost, NativeMeasurement, NativeOs, NativePlatform};
use tourkit_runtime::TourEngine;

#[derive(Default)]
struct Tree {
    layout: HashMap<&'static str, Rect>,
    pending: Vec<(&'static str, MeasureReply)>,
}

/// Replies are held until the test runs a layout pass.
#[derive(Clone)]
struct FakeTree {
    os: NativeOs,
    tree: Rc<RefCell<Tree>>,
}

impl FakeTree {
    fn new(os: NativeOs) -> Self {
        Self {
            os,
            tree: Rc::default(),
        }
    }

    fn lay_out(&self, view: &'static str, rect: Rect) {
        self.tree.borrow_mut().layout.insert(view, rect);
    }

    /// Answer every pending measurement. Returns how many were answered.
    fn layout_pass(&self) -> usize {
        let pending = std::mem::take(&mut self.tree.borrow_mut().pending);
        let answered = pending.len();
        for (view, reply) in pending {
            let rect = self.tree.borrow().layout.get(view).copied();
            reply(rect.map(|r| NativeMeasurement {
                x: 0.0,
                y: 0.0,
                width: r.width,
                height: r.height,
                page_x: r.left,
                page_y: r.top,
            }));
        }
        answered
    }
}

impl NativeHost for FakeTree {
    type View = &'static str;

    fn measure(&self, view: &&'static str, reply: MeasureReply) {
        self.tree.borrow_mut().pending.push((*view, reply));
    }

    fn window_size(&self) -> Size {
        Size::new(390.0, 844.0)
    }

    fn os(&self) -> NativeOs {
        self.os
    }
}

const AVATAR: Rect = Rect::new(20.0, 120.0, 64.0, 64.0);
const SETTINGS: Rect = Rect::new(300.0, 700.0, 60.0, 40.0);

struct Fixture {
    tree: FakeTree,
    platform: NativePlatform<FakeTree>,
    engine: TourEngine<NativePlatform<FakeTree>>,
    ended: Rc<RefCell<Vec<Option<String>>>>,
}

fn fixture(os: NativeOs) -> Fixture {
    init_test_logging();
    let tree = FakeTree::new(os);
    let platform = NativePlatform::new(tree.clone(), TargetRegistry::new());
    let engine = TourEngine::new(platform.clone());
    let ended = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&ended);
    engine.on_tour_end(move |id| sink.borrow_mut().push(id));
    Fixture {
        tree,
        platform,
        engine,
        ended,
    }
}

impl Fixture {
    /// Measure, settle the (no-op) scroll, and position the current step.
    fn run_step(&self) {
        let p = &self.platform;
        p.scheduler().run_until_stalled();
        self.tree.layout_pass();
        p.scheduler().run_until_stalled();
        p.advance(Duration::from_millis(350));
        p.advance(Duration::from_millis(50));
        p.animation_frame();
        self.tree.layout_pass();
        p.scheduler().run_until_stalled();
    }
}

#[test]
fn registered_view_is_measured_in_page_coordinates() {
    let f = fixture(NativeOs::Ios);
    let (avatar, _registration) = f.platform.register_target("avatar");
    avatar.attach("avatar-view");
    f.tree.lay_out("avatar-view", AVATAR);
    f.platform.report_tooltip_layout(Size::new(280.0, 120.0));

    f.engine.start_tour(
        vec![TourStep::new(TourTarget::id("avatar"), "Profile", "Tap to edit.")],
        Some("native".into()),
    );
    f.run_step();

    let view = f.engine.snapshot();
    assert!(view.shows_tooltip());
    assert_eq!(view.highlight_rect, Some(AVATAR));
    // Centered on x = 52, clamped to the 16pt margin; below the avatar.
    assert_eq!(view.tooltip_position.left, 16.0);
    assert_eq!(view.tooltip_position.top, 184.0 + 16.0);
}

#[test]
fn unregistered_ids_are_skipped() {
    let f = fixture(NativeOs::Android);
    let (settings, _registration) = f.platform.register_target("settings");
    settings.attach("settings-view");
    f.tree.lay_out("settings-view", SETTINGS);

    f.engine.start_tour(
        vec![
            TourStep::new(TourTarget::id("not-mounted"), "Gone", ""),
            TourStep::new(TourTarget::id("settings"), "Settings", ""),
        ],
        None,
    );
    f.run_step();

    assert_eq!(f.engine.current_step_index(), 1);
    let view = f.engine.snapshot();
    assert_eq!(view.highlight_rect, Some(SETTINGS));
    // No room below: flipped above the target.
    assert_eq!(view.tooltip_position.top, 700.0 - 200.0 - 16.0);
}

#[test]
fn plain_string_targets_are_registry_ids() {
    let f = fixture(NativeOs::Ios);
    let (button, _registration) = f.platform.register_target("welcome-button");
    button.attach("welcome-view");
    f.tree.lay_out("welcome-view", AVATAR);

    f.engine.start_tour(
        vec![TourStep::new("welcome-button", "Welcome", "Start here.")],
        Some("strings".into()),
    );
    f.run_step();

    assert!(f.engine.is_active());
    let view = f.engine.snapshot();
    assert_eq!(view.highlight_rect, Some(AVATAR));
    assert!(view.is_positioned);
    assert!(f.ended.borrow().is_empty());
}

#[test]
fn unregistered_plain_string_target_ends_tour() {
    let f = fixture(NativeOs::Ios);
    f.engine.start_tour(
        vec![TourStep::new("#avatar", "Profile", "")],
        Some("css".into()),
    );
    f.platform.scheduler().run_until_stalled();
    assert!(!f.engine.is_active());
    assert_eq!(*f.ended.borrow(), vec![Some("css".to_owned())]);
}

#[test]
fn back_button_closes_tour_on_android() {
    let f = fixture(NativeOs::Android);
    let (avatar, _registration) = f.platform.register_target("avatar");
    avatar.attach("avatar-view");
    f.tree.lay_out("avatar-view", AVATAR);
    assert!(!f.platform.hardware_back_press());

    f.engine.start_tour(
        vec![TourStep::new(TourTarget::id("avatar"), "Profile", "")],
        Some("back".into()),
    );
    f.run_step();
    assert!(f.platform.hardware_back_press());

    assert!(!f.engine.is_active());
    assert_eq!(*f.ended.borrow(), vec![Some("back".to_owned())]);
    assert!(!f.platform.hardware_back_press());
}

#[test]
fn back_button_is_ignored_on_ios() {
    let f = fixture(NativeOs::Ios);
    let (avatar, _registration) = f.platform.register_target("avatar");
    avatar.attach("avatar-view");
    f.tree.lay_out("avatar-view", AVATAR);
    f.engine.start_tour(vec![TourStep::new(TourTarget::id("avatar"), "Profile", "")], None);
    f.run_step();

    assert!(!f.platform.hardware_back_press());
    assert!(f.engine.is_active());
}

#[test]
fn late_reply_for_superseded_step_is_dropped() {
    let f = fixture(NativeOs::Ios);
    let registry = f.platform.registry().clone();
    let _avatar = registry.register_scoped("avatar", TargetRef::with_handle("avatar-view"));
    let _settings = registry.register_scoped("settings", TargetRef::with_handle("settings-view"));
    f.tree.lay_out("avatar-view", AVATAR);
    f.tree.lay_out("settings-view", SETTINGS);

    f.engine.start_tour(
        vec![
            TourStep::new(TourTarget::id("avatar"), "Profile", ""),
            TourStep::new(TourTarget::id("settings"), "Settings", ""),
        ],
        None,
    );
    f.platform.scheduler().run_until_stalled();
    f.engine.next_step();
    f.run_step();

    let view = f.engine.snapshot();
    assert_eq!(view.current_step_index, 1);
    assert_eq!(view.highlight_rect, Some(SETTINGS));
    assert!(view.is_positioned);
}

#[test]
fn dimension_change_remeasures() {
    let f = fixture(NativeOs::Other);
    let (avatar, _registration) = f.platform.register_target("avatar");
    avatar.attach("avatar-view");
    f.tree.lay_out("avatar-view", AVATAR);
    f.engine.start_tour(vec![TourStep::new(TourTarget::id("avatar"), "Profile", "")], None);
    f.run_step();

    let rotated = Rect::new(400.0, 60.0, 64.0, 64.0);
    f.tree.lay_out("avatar-view", rotated);
    let before = f.engine.positioning_passes();
    f.platform.dimensions_changed();
    assert_eq!(f.engine.positioning_passes(), before + 1);
    f.platform.animation_frame();
    assert_eq!(f.tree.layout_pass(), 1);
    f.platform.scheduler().run_until_stalled();

    assert_eq!(f.engine.snapshot().highlight_rect, Some(rotated));
}
