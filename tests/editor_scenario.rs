use capture_editor::element::factory;
use capture_editor::event::EventRecorder;
use capture_editor::field::PreparedFilter;
use capture_editor::filter::FilterKind;
use capture_editor::{
    ContainerId, DrawingMode, EditorConfig, EditorEvent, FieldOwner, FieldType, FieldValue, Filter, RenderMode,
    SharedSurface, Surface,
};
use egui::{Modifiers, Pos2, Rect, Vec2};
use image::{Rgba, RgbaImage};

fn test_surface() -> Surface {
    let config = EditorConfig { remember_field_values: false, ..EditorConfig::default() };
    Surface::new(RgbaImage::from_fn(200, 200, |x, y| Rgba([x as u8, y as u8, 128, 255])), config)
}

fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
    Rect::from_min_size(Pos2::new(x, y), Vec2::new(w, h))
}

fn create(surface: &mut Surface, bounds: Rect) -> ContainerId {
    surface.set_drawing_mode(Some(DrawingMode::Rectangle));
    surface.mouse_down(bounds.min, Modifiers::NONE).unwrap();
    surface.mouse_up(bounds.max, Modifiers::NONE).unwrap();
    surface.set_drawing_mode(None);
    surface.selected_ids()[0]
}

#[test]
fn test_create_pixelize_resize_then_undo_in_reverse() {
    let mut surface = test_surface();
    let id = create(&mut surface, rect(10.0, 10.0, 50.0, 50.0));

    let index = surface.add_filter(id, Filter::pixelize(8)).unwrap();
    let owner = FieldOwner::Filter { container: id, index };
    assert_eq!(surface.field_value(owner, FieldType::PixelSize).unwrap(), &FieldValue::Int(8));

    // one drag of the bottom-right handle, many pointer moves
    surface.mouse_down(Pos2::new(60.0, 60.0), Modifiers::NONE).unwrap();
    for step in 1..=20 {
        surface.mouse_move(Pos2::new(60.0 + step as f32, 60.0 + step as f32), Modifiers::NONE).unwrap();
    }
    surface.mouse_up(Pos2::new(90.0, 90.0), Modifiers::NONE).unwrap();
    assert_eq!(surface.get(id).unwrap().bounds(), rect(10.0, 10.0, 80.0, 80.0));
    assert_eq!(surface.history().undo_len(), 3);

    surface.undo().unwrap();
    let container = surface.get(id).unwrap();
    assert_eq!(container.bounds(), rect(10.0, 10.0, 50.0, 50.0));
    assert_eq!(container.filters().len(), 1);
    assert_eq!(container.filters()[0].kind(), FilterKind::Pixelize);

    surface.undo().unwrap();
    assert!(surface.get(id).unwrap().filters().is_empty());

    surface.undo().unwrap();
    assert!(surface.elements().is_empty());
    assert_eq!(surface.history().redo_len(), 3);
}

#[test]
fn test_events_follow_edits() {
    let mut surface = test_surface();
    let recorder = EventRecorder::new();
    surface.subscribe(Box::new(recorder.clone()));

    let container = factory::create_rectangle(rect(0.0, 0.0, 10.0, 10.0), surface.config());
    let id = surface.add_element(container, true).unwrap();
    surface.select(id).unwrap();
    surface
        .set_field_value(FieldOwner::Container(id), FieldType::LineThickness, FieldValue::Int(4))
        .unwrap();
    surface.undo().unwrap();

    let events = recorder.drain();
    assert!(events.contains(&EditorEvent::ElementsAdded(vec![id])));
    assert!(events.contains(&EditorEvent::SelectionChanged(vec![id])));
    let thickness_changes: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            EditorEvent::FieldChanged { value, .. } => Some(value.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(thickness_changes, vec![FieldValue::Int(4), FieldValue::Int(2)]);
    assert!(recorder.is_empty());
}

#[test]
fn test_save_and_load_gives_fresh_copies() {
    let mut surface = test_surface();
    let bubble = factory::create_speech_bubble(rect(20.0, 20.0, 80.0, 40.0), "look here", Pos2::new(10.0, 150.0), surface.config());
    let bubble = surface.add_element(bubble, true).unwrap();
    let arrow = factory::create_arrow(Pos2::new(150.0, 150.0), Pos2::new(100.0, 100.0), surface.config());
    surface.add_element(arrow, true).unwrap();
    let blurred = factory::create_rectangle(rect(0.0, 100.0, 40.0, 40.0), surface.config());
    let blurred = surface.add_element(blurred, true).unwrap();
    surface.add_filter(blurred, Filter::blur(4).inverted(true)).unwrap();
    let json = surface.save_elements().unwrap();

    let mut other = test_surface();
    let ids = other.load_elements_from_str(&json).unwrap();
    assert_eq!(ids.len(), 3);
    assert!(!ids.contains(&bubble));

    let loaded = other.get(ids[0]).unwrap();
    assert_eq!(loaded.text(), Some("look here"));
    assert_eq!(loaded.target(), Some(Pos2::new(10.0, 150.0)));
    assert_eq!(loaded.adorners().len(), 9);
    assert!(!loaded.is_selected());

    let loaded_arrow = other.get(ids[1]).unwrap();
    assert_eq!(loaded_arrow.endpoints(), Some((Pos2::new(150.0, 150.0), Pos2::new(100.0, 100.0))));

    let loaded_blur = other.get(ids[2]).unwrap();
    assert_eq!(loaded_blur.filters().len(), 1);
    assert!(loaded_blur.filters()[0].invert());

    assert_eq!(other.render(RenderMode::Export), surface.render(RenderMode::Export));

    // the whole load is one step
    other.undo().unwrap();
    assert!(other.elements().is_empty());
}

#[test]
fn test_background_render_matches_direct_render() {
    let mut surface = test_surface();
    let obfuscate = factory::create_obfuscate(rect(30.0, 30.0, 60.0, 60.0), surface.config());
    surface.add_element(obfuscate, true).unwrap();
    let expected = surface.render(RenderMode::Export);

    let shared = SharedSurface::new(surface);
    let pending = shared.render_in_background(RenderMode::Export);
    // edits after the snapshot do not leak into the pending render
    shared.with(|surface| surface.undo()).unwrap();
    let rendered = futures::executor::block_on(pending).unwrap();

    assert_eq!(rendered, expected);
    assert!(shared.lock().elements().is_empty());
}

#[test]
fn test_modified_flag_tracks_saves() {
    let mut surface = test_surface();
    assert!(!surface.is_modified());
    create(&mut surface, rect(10.0, 10.0, 30.0, 30.0));
    assert!(surface.is_modified());
    surface.mark_saved();
    assert!(!surface.is_modified());
    surface.undo().unwrap();
    assert!(surface.is_modified());
}

#[test]
fn test_display_follows_inverted_filter_container() {
    let mut surface = test_surface();
    surface.repaint();
    let highlight = factory::create_highlight(rect(40.0, 40.0, 60.0, 60.0), surface.config());
    let id = surface.add_element(highlight, true).unwrap();
    let area = FieldValue::PreparedFilter(PreparedFilter::AreaHighlight);
    surface.set_field_value(FieldOwner::Container(id), FieldType::PreparedFilter, area).unwrap();
    surface.repaint();
    assert_eq!(surface.display_image(), &surface.render(RenderMode::Edit));

    surface.remove_element(id, true).unwrap();
    surface.repaint();
    assert_eq!(surface.display_image(), &surface.render(RenderMode::Edit));
    assert_eq!(surface.display_image(), surface.background());

    surface.undo().unwrap();
    surface.repaint();
    assert_eq!(surface.display_image(), &surface.render(RenderMode::Edit));

    // back to a plain text highlight, which only touches its own rect
    surface.undo().unwrap();
    surface.repaint();
    assert_eq!(surface.display_image(), &surface.render(RenderMode::Edit));
    assert_eq!(surface.display_image().get_pixel(0, 0), surface.background().get_pixel(0, 0));
}
