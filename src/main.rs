// 该文件是 Xunse （寻色） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use xunse::{
  FromUrl,
  config::SteeringConfig,
  input::InputWrapper,
  model::ColorTargetModel,
  output::OutputSet,
  task::{ContinuousTask, OneShotTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("输入来源: {}", args.input);
  if let Some(serial) = &args.serial {
    info!("串口: {}", serial);
  }
  for output in &args.output {
    info!("可视化输出: {}", output);
  }

  let config = match &args.config {
    Some(path) => {
      info!("加载配置: {}", path.display());
      SteeringConfig::from_json_file(path)?
    }
    None => SteeringConfig::default(),
  };
  let model = ColorTargetModel::new(config)?;

  let output = OutputSet::from_urls(args.serial.as_ref(), &args.output)?;
  if output.is_empty() {
    warn!("没有任何输出，结果只会写入日志");
  }
  let input = InputWrapper::from_url(&args.input)?;

  if input.is_single_shot() {
    OneShotTask.run_task(input, model, output)?;
  } else {
    ContinuousTask::default()
      .with_frame_number(args.frame_number)
      .run_task(input, model, output)?;
  }

  Ok(())
}
