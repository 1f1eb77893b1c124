use capture_editor::element::factory;
use capture_editor::{DrawingMode, EditStatus, EditorConfig, Surface};
use egui::{CursorIcon, Modifiers, Pos2, Rect, Vec2};
use image::{Rgba, RgbaImage};

fn test_surface() -> Surface {
    let config = EditorConfig { remember_field_values: false, ..EditorConfig::default() };
    Surface::new(RgbaImage::from_pixel(200, 200, Rgba([255, 255, 255, 255])), config)
}

fn drag(surface: &mut Surface, from: Pos2, to: Pos2, modifiers: Modifiers) {
    surface.mouse_down(from, modifiers).unwrap();
    let middle = from + (to - from) / 2.0;
    surface.mouse_move(middle, modifiers).unwrap();
    surface.mouse_move(to, modifiers).unwrap();
    surface.mouse_up(to, modifiers).unwrap();
}

/// Draws a rectangle from (10, 10) to (110, 90) and leaves the surface in select mode.
fn draw_rectangle(surface: &mut Surface) -> capture_editor::ContainerId {
    surface.set_drawing_mode(Some(DrawingMode::Rectangle));
    drag(surface, Pos2::new(10.0, 10.0), Pos2::new(110.0, 90.0), Modifiers::NONE);
    surface.set_drawing_mode(None);
    surface.elements().ids()[0]
}

#[test]
fn test_drawing_gesture_adds_one_selected_element() {
    let mut surface = test_surface();
    let id = draw_rectangle(&mut surface);

    let container = surface.get(id).unwrap();
    assert_eq!(container.bounds(), Rect::from_min_max(Pos2::new(10.0, 10.0), Pos2::new(110.0, 90.0)));
    assert!(container.is_selected());
    assert_eq!(container.status(), EditStatus::Idle);
    assert_eq!(surface.history().undo_len(), 1);
    assert!(!surface.is_dragging());

    surface.undo().unwrap();
    assert!(surface.elements().is_empty());
}

#[test]
fn test_drawing_backwards_normalizes_bounds() {
    let mut surface = test_surface();
    surface.set_drawing_mode(Some(DrawingMode::Ellipse));
    drag(&mut surface, Pos2::new(80.0, 60.0), Pos2::new(20.0, 30.0), Modifiers::NONE);
    let container = surface.elements().iter().next().unwrap();
    assert_eq!(container.bounds(), Rect::from_min_max(Pos2::new(20.0, 30.0), Pos2::new(80.0, 60.0)));
}

#[test]
fn test_tiny_drawing_is_dropped() {
    let mut surface = test_surface();
    surface.set_drawing_mode(Some(DrawingMode::Rectangle));
    drag(&mut surface, Pos2::new(10.0, 10.0), Pos2::new(11.0, 30.0), Modifiers::NONE);
    assert!(surface.elements().is_empty());
    assert!(!surface.can_undo());
}

#[test]
fn test_click_without_drag_records_nothing() {
    let mut surface = test_surface();
    let id = draw_rectangle(&mut surface);
    let undo_len = surface.history().undo_len();

    let inside = Pos2::new(40.0, 50.0);
    surface.mouse_down(inside, Modifiers::NONE).unwrap();
    surface.mouse_up(inside, Modifiers::NONE).unwrap();

    let corner = Pos2::new(110.0, 90.0);
    surface.mouse_down(corner, Modifiers::NONE).unwrap();
    surface.mouse_up(corner, Modifiers::NONE).unwrap();

    assert_eq!(surface.history().undo_len(), undo_len);
    assert!(surface.get(id).unwrap().is_selected());
}

#[test]
fn test_corner_drag_resizes_in_one_step() {
    let mut surface = test_surface();
    let id = draw_rectangle(&mut surface);

    drag(&mut surface, Pos2::new(110.0, 90.0), Pos2::new(150.0, 120.0), Modifiers::NONE);
    assert_eq!(surface.get(id).unwrap().bounds(), Rect::from_min_max(Pos2::new(10.0, 10.0), Pos2::new(150.0, 120.0)));
    assert_eq!(surface.history().undo_len(), 2);
    assert_eq!(surface.get(id).unwrap().status(), EditStatus::Idle);

    surface.undo().unwrap();
    assert_eq!(surface.get(id).unwrap().bounds(), Rect::from_min_max(Pos2::new(10.0, 10.0), Pos2::new(110.0, 90.0)));
}

#[test]
fn test_resize_past_opposite_edge_stops_at_min_size() {
    let mut surface = test_surface();
    let id = draw_rectangle(&mut surface);
    let min_size = surface.config().min_element_size;

    drag(&mut surface, Pos2::new(110.0, 50.0), Pos2::new(0.0, 50.0), Modifiers::NONE);
    let bounds = surface.get(id).unwrap().bounds();
    assert_eq!(bounds.left(), 10.0);
    assert_eq!(bounds.width(), min_size);
}

#[test]
fn test_body_drag_moves_selection() {
    let mut surface = test_surface();
    let id = draw_rectangle(&mut surface);

    drag(&mut surface, Pos2::new(40.0, 50.0), Pos2::new(60.0, 80.0), Modifiers::NONE);
    assert_eq!(surface.get(id).unwrap().location(), Pos2::new(30.0, 40.0));
    assert_eq!(surface.history().undo_len(), 2);

    surface.undo().unwrap();
    assert_eq!(surface.get(id).unwrap().location(), Pos2::new(10.0, 10.0));
}

#[test]
fn test_shift_click_extends_selection_and_empty_click_clears() {
    let mut surface = test_surface();
    let a = surface.add_element(factory::create_rectangle(Rect::from_min_size(Pos2::new(10.0, 10.0), Vec2::splat(30.0)), surface.config()), true).unwrap();
    let b = surface.add_element(factory::create_rectangle(Rect::from_min_size(Pos2::new(100.0, 100.0), Vec2::splat(30.0)), surface.config()), true).unwrap();

    surface.mouse_down(Pos2::new(25.0, 25.0), Modifiers::NONE).unwrap();
    surface.mouse_up(Pos2::new(25.0, 25.0), Modifiers::NONE).unwrap();
    surface.mouse_down(Pos2::new(115.0, 115.0), Modifiers::SHIFT).unwrap();
    surface.mouse_up(Pos2::new(115.0, 115.0), Modifiers::SHIFT).unwrap();
    assert_eq!(surface.selected_ids(), vec![a, b]);

    surface.mouse_down(Pos2::new(190.0, 10.0), Modifiers::NONE).unwrap();
    surface.mouse_up(Pos2::new(190.0, 10.0), Modifiers::NONE).unwrap();
    assert!(surface.selected_ids().is_empty());
}

#[test]
fn test_target_drag_reflects_back_into_image() {
    let mut surface = test_surface();
    let bounds = Rect::from_min_size(Pos2::new(50.0, 50.0), Vec2::new(60.0, 40.0));
    let bubble = factory::create_speech_bubble(bounds, "hi", Pos2::new(30.0, 150.0), surface.config());
    let id = surface.add_element(bubble, true).unwrap();
    surface.select_only(id).unwrap();

    drag(&mut surface, Pos2::new(30.0, 150.0), Pos2::new(-10.0, 60.0), Modifiers::NONE);
    assert_eq!(surface.get(id).unwrap().target(), Some(Pos2::new(10.0, 60.0)));

    surface.undo().unwrap();
    assert_eq!(surface.get(id).unwrap().target(), Some(Pos2::new(30.0, 150.0)));
    assert_eq!(surface.get(id).unwrap().bounds(), bounds);
}

#[test]
fn test_new_speech_bubble_gets_tail_inside_image() {
    let mut surface = test_surface();
    surface.set_drawing_mode(Some(DrawingMode::SpeechBubble));
    drag(&mut surface, Pos2::new(20.0, 120.0), Pos2::new(100.0, 180.0), Modifiers::NONE);
    let target = surface.elements().iter().next().unwrap().target().unwrap();
    assert!(surface.image_rect().contains(target));
}

#[test]
fn test_cursor_follows_what_is_under_pointer() {
    let mut surface = test_surface();
    draw_rectangle(&mut surface);
    assert_eq!(surface.cursor_at(Pos2::new(110.0, 90.0)), CursorIcon::ResizeNwSe);
    assert_eq!(surface.cursor_at(Pos2::new(40.0, 50.0)), CursorIcon::Move);
    assert_eq!(surface.cursor_at(Pos2::new(180.0, 180.0)), CursorIcon::Default);
    surface.set_drawing_mode(Some(DrawingMode::Line));
    assert_eq!(surface.cursor_at(Pos2::new(180.0, 180.0)), CursorIcon::Crosshair);
}
