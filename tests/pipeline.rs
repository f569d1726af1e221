// 该文件是 Xunse （寻色） 项目的一部分。
// tests/pipeline.rs - 合成帧上的端到端测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use approx::assert_relative_eq;
use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};

use xunse::{
  config::SteeringConfig,
  frame::Frame,
  model::{ColorTargetModel, Model, PixelRect, TargetColor},
};

const BLUE: Rgb<u8> = Rgb([0, 200, 255]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);

fn canvas() -> RgbImage {
  RgbImage::new(1280, 720)
}

fn paint(image: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, w: u32, h: u32) {
  draw_filled_rect_mut(image, Rect::at(x, y).of_size(w, h), color);
}

#[test]
fn empty_frame_goes_straight() {
  let result = ColorTargetModel::default().evaluate(&canvas());
  assert!(result.is_empty());
  assert_eq!(result.steering_deg, 0);
}

#[test]
fn centered_blue_target_alone() {
  let mut image = canvas();
  paint(&mut image, BLUE, 560, 200, 150, 290);

  let result = ColorTargetModel::default().evaluate(&image);
  let blue = result.blue.expect("blue target");
  assert!(result.red.is_none());
  assert_eq!(blue.rect, PixelRect::new(560, 200, 150, 290));
  assert_relative_eq!(blue.distance_mm, 500.0);
  assert_relative_eq!(blue.angle_rad, 0.0);
  assert_eq!(result.steering_deg, -20);
}

#[test]
fn nearer_red_target_takes_priority() {
  let mut image = canvas();
  paint(&mut image, BLUE, 560, 200, 150, 290);
  paint(&mut image, RED, 100, 150, 100, 300);

  let result = ColorTargetModel::default().evaluate(&image);
  let red = result.detection(TargetColor::Red).expect("red target");
  assert_relative_eq!(red.distance_mm, 1450.0 * 100.0 / 300.0, epsilon = 1e-9);
  assert!(red.angle_deg() < -18.0 && red.angle_deg() > -19.0);
  // -18.74 + 20
  assert_eq!(result.steering_deg, 1);
  assert_eq!(result.detections().count(), 2);
}

#[test]
fn nearest_of_several_blobs_is_selected() {
  let mut image = canvas();
  paint(&mut image, RED, 100, 100, 80, 200);
  paint(&mut image, RED, 900, 100, 80, 320);

  let result = ColorTargetModel::default().evaluate(&image);
  let red = result.red.expect("red target");
  assert_eq!(red.rect.x, 900);
  assert_eq!(red.rect.height, 320);
}

#[test]
fn specks_are_ignored() {
  let mut image = canvas();
  paint(&mut image, BLUE, 600, 300, 30, 30);
  paint(&mut image, RED, 200, 300, 2, 2);

  let result = ColorTargetModel::default().evaluate(&image);
  assert!(result.is_empty());
  assert_eq!(result.steering_deg, 0);
}

#[test]
fn distant_targets_are_reported_but_ignored() {
  let mut image = canvas();
  paint(&mut image, BLUE, 560, 300, 150, 100);

  let result = ColorTargetModel::default().evaluate(&image);
  let blue = result.blue.expect("blue target");
  assert!(blue.distance_mm > 600.0);
  assert_eq!(result.steering_deg, 0);
}

#[test]
fn config_file_overrides_cutoff() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("xunse.json");
  std::fs::write(&path, r#"{ "max_effective_distance_mm": 450.0 }"#).expect("write");
  let config = SteeringConfig::from_json_file(&path).expect("config");
  let model = ColorTargetModel::new(config).expect("model");

  let mut image = canvas();
  paint(&mut image, BLUE, 560, 200, 150, 290);
  paint(&mut image, RED, 100, 150, 100, 300);

  let result = model.evaluate(&image);
  assert!(result.blue.is_some());
  assert!(result.red.is_some());
  assert_eq!(result.steering_deg, 0);
}

#[test]
fn frames_are_evaluated_independently() {
  let model = ColorTargetModel::default();

  let mut first = canvas();
  paint(&mut first, BLUE, 560, 200, 150, 290);
  let first = model
    .infer(&Frame::new(first, 0, 0))
    .expect("infer");
  assert_eq!(first.steering_deg, -20);

  let second = model
    .infer(&Frame::new(canvas(), 1, 33))
    .expect("infer");
  assert_eq!(second.steering_deg, 0);
}

#[cfg(all(feature = "read_image_file", feature = "save_image_file"))]
#[test]
fn one_shot_file_to_file() {
  use url::Url;
  use xunse::{
    FromUrl,
    input::InputWrapper,
    output::OutputSet,
    task::{OneShotTask, Task},
  };

  let dir = tempfile::tempdir().expect("tempdir");
  let source = dir.path().join("frame.png");
  let target = dir.path().join("annotated.png");

  let mut image = canvas();
  paint(&mut image, BLUE, 560, 200, 150, 290);
  image.save(&source).expect("save source");

  let input = InputWrapper::from_url(
    &Url::parse(&format!("image://{}", source.display())).expect("url"),
  )
  .expect("input");
  assert!(input.is_single_shot());
  let output = OutputSet::from_urls(
    None,
    &[Url::parse(&format!("image://{}", target.display())).expect("url")],
  )
  .expect("output");

  OneShotTask
    .run_task(input, ColorTargetModel::default(), output)
    .expect("task");

  let annotated = image::open(&target).expect("annotated").to_rgb8();
  assert_eq!(annotated.dimensions(), (1280, 720));
  // 边框覆盖在目标的左上角
  assert_eq!(*annotated.get_pixel(560, 200), Rgb([0, 0, 255]));
  assert_eq!(*annotated.get_pixel(635, 345), BLUE);
}
