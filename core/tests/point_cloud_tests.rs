use cv_core::{
    CameraIntrinsics, DepthImage, Normal, NormalMap, OrganizedPointCloud, OrganizedPointCloudBuf,
    PointLayout,
};
use image::Luma;
use nalgebra::{Point3, Vector3};

#[test]
fn test_packed_layout_validation() {
    let data = vec![0.0f32; 4 * 3 * 3];
    assert!(OrganizedPointCloud::from_packed(&data, 4, 3).is_ok());

    // Too short for the requested grid
    let err = OrganizedPointCloud::from_packed(&data[..30], 4, 3).unwrap_err();
    assert!(err.to_string().contains("needs 36"));

    // Zero-sized grids are rejected
    assert!(OrganizedPointCloud::from_packed(&data, 0, 3).is_err());
    assert!(OrganizedPointCloud::from_packed(&data, 4, 0).is_err());
}

#[test]
fn test_inconsistent_strides_rejected() {
    let data = vec![0.0f32; 64];

    // xyz does not fit inside the element
    let layout = PointLayout::padded(3, 4).with_xyz_offset(1);
    assert!(OrganizedPointCloud::new(&data, 4, 2, layout).is_err());

    // Row stride shorter than one row of points
    let layout = PointLayout::padded(4, 4).with_row_stride(12);
    assert!(OrganizedPointCloud::new(&data, 4, 2, layout).is_err());
}

#[test]
fn test_strided_view_reads_foreign_buffer() {
    // XYZ + intensity + padding: 5 floats per point, xyz starts at 1
    let width = 3;
    let height = 2;
    let layout = PointLayout::padded(5, width).with_xyz_offset(1);
    let mut data = vec![-1.0f32; layout.required_len(width, height)];
    for row in 0..height {
        for col in 0..width {
            let i = layout.index(col, row);
            data[i + 1] = col as f32;
            data[i + 2] = row as f32;
            data[i + 3] = 10.0 + (row * width + col) as f32;
        }
    }

    let cloud = OrganizedPointCloud::new(&data, width, height, layout).unwrap();
    assert_eq!(cloud.len(), 6);
    assert_eq!(cloud.point(2, 1), Point3::new(2.0, 1.0, 15.0));
    assert_eq!(cloud.depth(1, 0), 11.0);
    assert_eq!(cloud.xyz_data()[layout.index(1, 1) + 2], 14.0);
}

#[test]
fn test_buffer_from_points() {
    let points: Vec<Point3<f32>> = (0..6)
        .map(|i| Point3::new(i as f32, 0.0, 1.0))
        .collect();
    let buf = OrganizedPointCloudBuf::from_points(&points, 3, 2).unwrap();
    let view = buf.view();
    assert_eq!(view.width(), 3);
    assert_eq!(view.height(), 2);
    assert_eq!(view.point(1, 1), Point3::new(4.0, 0.0, 1.0));

    let bad = OrganizedPointCloudBuf::from_points(&points, 4, 2);
    assert!(bad.unwrap_err().to_string().contains("Point count"));
}

#[test]
fn test_from_depth_image_backprojects() {
    let intrinsics = CameraIntrinsics::new(100.0, 100.0, 2.0, 2.0, 4, 4);
    let mut depth = DepthImage::from_pixel(4, 4, Luma([1000.0]));
    depth.put_pixel(0, 0, Luma([0.0]));

    let buf = OrganizedPointCloudBuf::from_depth_image(&depth, &intrinsics, 0.001).unwrap();
    let view = buf.view();

    assert!(view.depth(0, 0).is_nan());
    let p = view.point(3, 2);
    assert!((p.z - 1.0).abs() < 1e-6);
    assert!((p.x - 0.01).abs() < 1e-6);
    assert!(p.y.abs() < 1e-6);

    let wrong = CameraIntrinsics::new(100.0, 100.0, 2.0, 2.0, 8, 8);
    assert!(OrganizedPointCloudBuf::from_depth_image(&depth, &wrong, 0.001).is_err());
    assert!(OrganizedPointCloudBuf::from_depth_image(&depth, &intrinsics, 0.0).is_err());
}

#[test]
fn test_intrinsics_from_json() {
    let json = r#"{"fx":525.0,"fy":525.0,"cx":319.5,"cy":239.5,"width":640,"height":480}"#;
    let intrinsics: CameraIntrinsics = serde_json::from_str(json).unwrap();
    assert!(intrinsics.is_valid());
    assert_eq!(intrinsics.matrix()[(0, 2)], 319.5);
}

#[test]
fn test_normal_sentinel_handling() {
    assert!(Normal::from_unnormalized(Vector3::zeros(), -1.0).is_zero());
    assert!(Normal::from_unnormalized(Vector3::new(f32::NAN, 0.0, 1.0), 1.0).is_zero());
    assert!(Normal::from_unnormalized(Vector3::new(f32::INFINITY, 0.0, 1.0), 1.0).is_zero());

    let n = Normal::from_unnormalized(Vector3::new(0.0, 3.0, 4.0), -1.0);
    assert!(n.is_valid());
    assert!((n.normal.z + 0.8).abs() < 1e-6);
    assert_eq!(n.curvature, 0.0);

    let mut map = NormalMap::new(3, 2);
    assert_eq!(map.valid_count(), 0);
    map.set(2, 1, n);
    assert_eq!(map.valid_count(), 1);
    assert_eq!(map.get(2, 1), n);
    assert_eq!(map.rows().count(), 2);
}

#[test]
fn test_tiny_vectors_normalize_to_unit_length() {
    // squared components fall into the subnormal range
    let v = Vector3::new(3.0e-23f32, -2.0e-23, -1.0e-22);
    let n = Normal::from_unnormalized(v, -1.0);
    assert!(n.is_valid(), "{:?} has length {}", n.normal, n.normal.norm());
    let expected = -v.cast::<f64>().normalize();
    for i in 0..3 {
        assert!((n.normal[i] as f64 - expected[i]).abs() < 1e-6);
    }

    let n = Normal::from_unnormalized(Vector3::new(0.0, f32::MIN_POSITIVE * 1e-3, 0.0), 1.0);
    assert!(n.is_valid());
    assert_eq!(n.normal, Vector3::new(0.0, 1.0, 0.0));

    let n = Normal::from_unnormalized(Vector3::new(3.0e30f32, 4.0e30, 0.0), 1.0);
    assert!(n.is_valid());
}
