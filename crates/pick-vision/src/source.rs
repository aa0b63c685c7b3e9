//! 图像源
//!
//! 相机驱动不在本 crate 内；这里提供两种基于文件的实现：
//! - [`ImageDirSource`]：按文件名顺序回放一个目录的图像
//! - [`SnapshotSource`]：每次重新读取同一路径（外部程序不断覆盖写入）

use crate::error::VisionError;
use cobot_tools::FrameSourceSettings;
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// 帧来源
pub trait FrameSource: Send {
    /// 读取下一帧；没有更多帧时返回 [`VisionError::SourceExhausted`]
    fn read(&mut self) -> Result<RgbImage, VisionError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read(&mut self) -> Result<RgbImage, VisionError> {
        (**self).read()
    }
}

/// 按配置创建图像源
pub fn open_source(settings: &FrameSourceSettings) -> Result<Box<dyn FrameSource>, VisionError> {
    Ok(match settings {
        FrameSourceSettings::Directory { path, repeat } => {
            Box::new(ImageDirSource::open(path)?.repeat(*repeat))
        },
        FrameSourceSettings::Snapshot { path } => Box::new(SnapshotSource::new(path)),
    })
}

/// 目录回放
#[derive(Debug)]
pub struct ImageDirSource {
    files: Vec<PathBuf>,
    next: usize,
    repeat: bool,
}

impl ImageDirSource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, VisionError> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| VisionError::io(dir, e))? {
            let path = entry.map_err(|e| VisionError::io(dir, e))?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if is_image && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(Self {
            files,
            next: 0,
            repeat: false,
        })
    }

    /// 读完后从头循环
    pub fn repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for ImageDirSource {
    fn read(&mut self) -> Result<RgbImage, VisionError> {
        if self.next >= self.files.len() {
            if !self.repeat || self.files.is_empty() {
                return Err(VisionError::SourceExhausted);
            }
            self.next = 0;
        }
        let path = &self.files[self.next];
        self.next += 1;
        Ok(image::open(path)?.to_rgb8())
    }
}

/// 单文件快照
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for SnapshotSource {
    fn read(&mut self) -> Result<RgbImage, VisionError> {
        Ok(image::open(&self.path)?.to_rgb8())
    }
}
