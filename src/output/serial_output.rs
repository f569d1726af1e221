// 该文件是 Xunse （寻色） 项目的一部分。
// src/output/serial_output.rs - 串口转向指令输出
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

//! # 串口输出
//!
//! URL 格式：`serial:///dev/ttyACM0?baud=9600&settle_ms=2000&timeout_ms=100`
//!
//! 每帧写入一行 ASCII 十进制转向角，以 `\n` 结尾。打开串口后等待
//! `settle_ms`，给下位机复位留出时间。

use std::io::Write;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Frame,
  model::SteeringResult,
  output::Render,
  query_value,
};

const SERIAL_DEFAULT_BAUD: u32 = 9600;
const SERIAL_DEFAULT_SETTLE_MS: u64 = 2000;
const SERIAL_DEFAULT_TIMEOUT_MS: u64 = 100;

#[derive(Error, Debug)]
pub enum SerialOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("参数无效: {0}")]
  InvalidParameter(String),
  #[error("串口打开错误: {0}")]
  OpenError(#[from] serialport::Error),
  #[error("串口写入错误: {0}")]
  WriteError(#[from] std::io::Error),
  #[error("串口句柄已损坏")]
  Poisoned,
}

/// 串口连接参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
  pub path: String,
  pub baud: u32,
  pub settle: Duration,
  pub timeout: Duration,
}

impl FromUrlWithScheme for SerialSettings {
  const SCHEME: &'static str = "serial";
}

fn parse_query<T: std::str::FromStr>(
  url: &Url,
  key: &str,
  default: T,
) -> Result<T, SerialOutputError> {
  match query_value(url, key) {
    Some(v) => v
      .parse()
      .map_err(|_| SerialOutputError::InvalidParameter(format!("{}={}", key, v))),
    None => Ok(default),
  }
}

impl FromUrl for SerialSettings {
  type Error = SerialOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(SerialOutputError::SchemeMismatch);
    }
    if url.path().is_empty() || url.path() == "/" {
      return Err(SerialOutputError::InvalidParameter("缺少串口设备路径".to_string()));
    }

    Ok(SerialSettings {
      path: url.path().to_string(),
      baud: parse_query(url, "baud", SERIAL_DEFAULT_BAUD)?,
      settle: Duration::from_millis(parse_query(url, "settle_ms", SERIAL_DEFAULT_SETTLE_MS)?),
      timeout: Duration::from_millis(parse_query(url, "timeout_ms", SERIAL_DEFAULT_TIMEOUT_MS)?),
    })
  }
}

/// 转向指令的线上格式
pub fn encode_command(steering_deg: i32) -> String {
  format!("{}\n", steering_deg)
}

pub struct SerialOutput {
  settings: SerialSettings,
  port: Mutex<Box<dyn Write + Send>>,
}

impl SerialOutput {
  pub fn open(settings: SerialSettings) -> Result<Self, SerialOutputError> {
    info!("打开串口: {} @ {}", settings.path, settings.baud);
    let port = serialport::new(&settings.path, settings.baud)
      .timeout(settings.timeout)
      .open()?;
    if !settings.settle.is_zero() {
      debug!("等待下位机就绪: {:?}", settings.settle);
      thread::sleep(settings.settle);
    }
    Ok(Self::with_port(settings, port))
  }

  /// 在已打开的写端上发送指令
  pub fn with_port(settings: SerialSettings, port: impl Write + Send + 'static) -> Self {
    Self {
      settings,
      port: Mutex::new(Box::new(port)),
    }
  }

  pub fn send(&self, steering_deg: i32) -> Result<(), SerialOutputError> {
    let line = encode_command(steering_deg);
    let mut port = self.port.lock().map_err(|_| SerialOutputError::Poisoned)?;
    port.write_all(line.as_bytes())?;
    port.flush()?;
    debug!("串口发送: {}", line.trim_end());
    Ok(())
  }
}

impl FromUrlWithScheme for SerialOutput {
  const SCHEME: &'static str = SerialSettings::SCHEME;
}

impl FromUrl for SerialOutput {
  type Error = SerialOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    Self::open(SerialSettings::from_url(url)?)
  }
}

impl Render<Frame, SteeringResult> for SerialOutput {
  type Error = SerialOutputError;

  fn render_result(&self, _frame: &Frame, result: &SteeringResult) -> Result<(), Self::Error> {
    self.send(result.steering_deg)
  }
}

impl Drop for SerialOutput {
  fn drop(&mut self) {
    info!("关闭串口: {}", self.settings.path);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn command_is_decimal_line() {
    assert_eq!(encode_command(-14), "-14\n");
    assert_eq!(encode_command(0), "0\n");
    assert_eq!(encode_command(107), "107\n");
  }

  #[test]
  fn settings_defaults() {
    let url = Url::parse("serial:///dev/ttyACM0").expect("url");
    let settings = SerialSettings::from_url(&url).expect("settings");
    assert_eq!(
      settings,
      SerialSettings {
        path: "/dev/ttyACM0".to_string(),
        baud: 9600,
        settle: Duration::from_millis(2000),
        timeout: Duration::from_millis(100),
      }
    );
  }

  #[test]
  fn settings_from_query() {
    let url = Url::parse("serial:///dev/ttyUSB1?baud=115200&settle_ms=0").expect("url");
    let settings = SerialSettings::from_url(&url).expect("settings");
    assert_eq!(settings.path, "/dev/ttyUSB1");
    assert_eq!(settings.baud, 115200);
    assert!(settings.settle.is_zero());
  }

  #[test]
  fn settings_reject_bad_input() {
    let url = Url::parse("serial:///dev/ttyACM0?baud=fast").expect("url");
    assert!(matches!(
      SerialSettings::from_url(&url),
      Err(SerialOutputError::InvalidParameter(_))
    ));
    let url = Url::parse("image:///dev/ttyACM0").expect("url");
    assert!(matches!(
      SerialSettings::from_url(&url),
      Err(SerialOutputError::SchemeMismatch)
    ));
  }

  #[derive(Clone, Default)]
  struct SharedPort(std::sync::Arc<Mutex<Vec<u8>>>);

  impl Write for SharedPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
      self.0.lock().expect("lock").extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
      Ok(())
    }
  }

  #[test]
  fn each_frame_writes_one_line() {
    let port = SharedPort::default();
    let settings = SerialSettings::from_url(&Url::parse("serial:///dev/ttyACM0").expect("url"))
      .expect("settings");
    let output = SerialOutput::with_port(settings, port.clone());

    output.send(-14).expect("send");
    output.send(20).expect("send");
    assert_eq!(port.0.lock().expect("lock").as_slice(), b"-14\n20\n");
  }

  #[test]
  fn missing_device_fails_to_open() {
    let url = Url::parse("serial:///dev/xunse-no-such-port?settle_ms=0").expect("url");
    assert!(matches!(
      SerialOutput::from_url(&url),
      Err(SerialOutputError::OpenError(_))
    ));
  }
}
