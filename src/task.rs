// 该文件是 Xunse （寻色） 项目的一部分。
// src/task.rs - 任务循环
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

use std::sync::mpsc::{self, Receiver};
use std::{thread, time::Duration, time::Instant};

use tracing::{info, warn};

use crate::{model::Model, output::Render};

const FORCE_EXIT_AFTER: Duration = Duration::from_secs(30);

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 按“输入源 → 输出”的顺序释放资源
fn release<I, O>(input: I, output: O) {
  drop(input);
  info!("输入源已释放");
  drop(output);
  info!("输出已释放");
}

pub struct OneShotTask;

impl<F, D, ME, RE, I, M, O> Task<I, M, O> for OneShotTask
where
  D: std::fmt::Debug,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let outcome = (|| -> anyhow::Result<()> {
      let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
      let now = Instant::now();
      let result = model.infer(&frame)?;
      info!("推理完成，耗时: {:.2?}, 结果: {:?}", now.elapsed(), result);
      output.render_result(&frame, &result)?;
      Ok(())
    })();
    release(input, output);
    outcome
  }
}

#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  fn install_interrupt() -> anyhow::Result<Receiver<()>> {
    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(FORCE_EXIT_AFTER);
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;
    Ok(rx)
  }

  fn run_loop<F, D, ME, RE, M, O>(
    &self,
    input: &mut impl Iterator<Item = F>,
    model: &M,
    output: &O,
    interrupt: &Receiver<()>,
  ) -> anyhow::Result<usize>
  where
    D: std::fmt::Debug,
    ME: std::error::Error + Sync + Send + 'static,
    RE: std::error::Error + Sync + Send + 'static,
    M: Model<Input = F, Output = D, Error = ME>,
    O: Render<F, D, Error = RE>,
  {
    let mut processed = 0usize;
    let mut now = Instant::now();
    for frame in input {
      let result = model.infer(&frame)?;
      let elapsed_a = now.elapsed();
      output.render_result(&frame, &result)?;
      let elapsed_b = now.elapsed();
      now = Instant::now();
      processed += 1;
      info!(
        "第 {} 帧: {:?}（耗时 {:.2?} / {:.2?}）",
        processed, result, elapsed_a, elapsed_b
      );

      if self.frame_number.is_some_and(|n| processed >= n) {
        info!("达到指定帧数 {}, 退出任务循环", processed);
        break;
      }
      if interrupt.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }
    Ok(processed)
  }

  fn run_and_release<F, D, ME, RE, I, M, O>(
    &self,
    mut input: I,
    model: &M,
    output: O,
    interrupt: &Receiver<()>,
  ) -> anyhow::Result<usize>
  where
    D: std::fmt::Debug,
    ME: std::error::Error + Sync + Send + 'static,
    RE: std::error::Error + Sync + Send + 'static,
    I: Iterator<Item = F>,
    M: Model<Input = F, Output = D, Error = ME>,
    O: Render<F, D, Error = RE>,
  {
    let outcome = self.run_loop(&mut input, model, &output, interrupt);
    release(input, output);
    outcome
  }
}

impl<F, D, ME, RE, I, M, O> Task<I, M, O> for ContinuousTask
where
  D: std::fmt::Debug,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let interrupt = match Self::install_interrupt() {
      Ok(interrupt) => interrupt,
      Err(e) => {
        release(input, output);
        return Err(e);
      }
    };

    let processed = self.run_and_release(input, &model, output, &interrupt)?;
    info!("任务完成，共处理 {} 帧", processed);
    Ok(())
  }
}
