//! Integration tests for the receipt-rs library API

#[test]
fn test_prelude_imports() {
    // This test verifies that the prelude module exports everything correctly
    use receipt_rs::prelude::*;

    let classes = ClassList::receipt();
    assert_eq!(classes.len(), RECEIPT_CLASSES.len());

    let detections = parse_label_file(
        "2 0.5 0.05 0.5 0.1 0.9\n3 0.9 0.05 0.1 0.1 0.8\n",
        100,
        200,
        &classes,
    );
    assert_eq!(detections.len(), 2);

    let score = vertical_iou(&detections[0].bbox, &detections[1].bbox);
    assert!(score > 0.9);

    let products = vec![&detections[0]];
    let quantities = vec![&detections[1]];
    let items = pair_line_items(&products, &quantities, &[]);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity.map(|d| d.class_name.as_str()), Some("quantity"));
}

#[test]
fn test_decode_full_frame() {
    use receipt_rs::{decode_label_line, ClassList, PixelBox};

    let det = decode_label_line("0 0.5 0.5 1.0 1.0", 100, 200, &ClassList::receipt()).unwrap();
    assert_eq!(det.bbox, PixelBox::new(0, 0, 99, 199));
}

#[test]
fn test_pairing_leaves_unoverlapped_product_empty() {
    use receipt_rs::{pair_line_items, Detection, PixelBox};

    let det = |name: &str, y1: u32, y2: u32| Detection {
        class_id: 0,
        class_name: name.to_string(),
        bbox: PixelBox::new(0, y1, 10, y2),
        confidence: 1.0,
    };
    let p1 = det("product", 0, 10);
    let p2 = det("product", 20, 30);
    let q = det("quantity", 0, 10);

    let items = pair_line_items(&[&p1, &p2], &[&q], &[]);
    assert_eq!(items[0].quantity, Some(&q));
    assert_eq!(items[1].quantity, None);
}

#[test]
fn test_single_field_selection() {
    use receipt_rs::{select_single, Detection, PixelBox, ReceiptField};

    let det = |conf: f32, x1: u32| Detection {
        class_id: 1,
        class_name: "phone_number".to_string(),
        bbox: PixelBox::new(x1, 0, x1 + 5, 5),
        confidence: conf,
    };
    let dets = vec![det(0.2, 0), det(0.6, 10), det(0.6, 20)];

    let chosen = select_single(&dets, ReceiptField::PhoneNumber).unwrap();
    assert_eq!(chosen.bbox.x1, 10);
    assert!(select_single(&dets, ReceiptField::CompanyName).is_none());
}

#[test]
fn test_pipeline_types() {
    // This test verifies the pipeline types are publicly accessible
    use receipt_rs::{PipelineOptions, Yolov5Detector, Yolov5Options};
    use std::path::PathBuf;

    let detector = Yolov5Detector::new(Yolov5Options::default());
    let options = PipelineOptions {
        weights: detector.weights_path(),
        yaml_path: PathBuf::from("data/receipts.yaml"),
    };
    assert_eq!(options.weights, PipelineOptions::default().weights);
}
