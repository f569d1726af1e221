// 该文件是 Xunse （寻色） 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::path::PathBuf;

use clap::Parser;
use url::Url;

/// Xunse 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入来源
  /// 支持格式:
  /// - 图片: image:///path/to/frame.png
  /// - V4L2: v4l:///dev/video0?width=1280&height=720&fourcc=YUYV
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 串口执行器，例如 serial:///dev/ttyACM0?baud=9600
  #[arg(long, value_name = "SERIAL")]
  pub serial: Option<Url>,

  /// 可视化输出，可重复指定；不指定时不做可视化
  /// 支持格式:
  /// - 单张图片: image:///tmp/xunse.png?font=/path/to/font.ttf
  /// - 按日期记录: folder:///var/log/xunse?always
  #[arg(long, value_name = "OUTPUT")]
  pub output: Vec<Url>,

  /// JSON 配置文件，缺省时使用内置参考参数
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// 最大处理帧数（仅对摄像头有效）
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,
}
