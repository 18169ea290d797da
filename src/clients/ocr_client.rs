/// OCR 客户端
///
/// 通过 tesseract 命令行识别验证码图片
use std::io::Cursor;
use std::process::Stdio;

use image::{DynamicImage, ImageFormat};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;
use crate::error::{QueryError, Result};

/// 图片转文字能力
#[allow(async_fn_in_trait)]
pub trait OcrEngine {
    async fn recognize_text(&self, image: &DynamicImage) -> Result<String>;
}

/// tesseract 命令行 OCR
///
/// 图片以 PNG 形式写入 stdin，识别结果从 stdout 读取，不落盘。
pub struct TesseractOcr {
    program: String,
    psm: u8,
}

impl TesseractOcr {
    pub fn new(config: &Config) -> Self {
        Self {
            program: config.tesseract_path.clone(),
            psm: config.tesseract_psm,
        }
    }
}

impl OcrEngine for TesseractOcr {
    async fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        debug!("调用 {} 识别验证码，图片 {} 字节", self.program, png.len());

        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout", "--psm", &self.psm.to_string()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| QueryError::Ocr(format!("无法启动 {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&png)
                .await
                .map_err(|e| QueryError::Ocr(format!("写入图片失败: {}", e)))?;
            // 关闭 stdin，tesseract 才会开始识别
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| QueryError::Ocr(format!("读取识别结果失败: {}", e)))?;
        if !output.status.success() {
            return Err(QueryError::Ocr(format!(
                "{} 退出码 {:?}: {}",
                self.program,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
