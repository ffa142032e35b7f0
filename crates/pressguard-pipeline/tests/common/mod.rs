// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures for the pipeline integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use pressguard_core::config::CleanupConfig;
use pressguard_core::error::{PressguardError, Result};
use pressguard_core::{KernelSize, PageImage, PipelineConfig, page_file_name};
use pressguard_document::Rasterizer;

/// Raster width of marker 0; marker `n` renders `BASE_WIDTH + n` pixels wide.
pub const BASE_WIDTH: u32 = 96;
const RASTER_HEIGHT: u32 = 24;

/// In-process rasterizer that needs no rendering engine.
///
/// Source pages carry `% marker N` in their content; recomposed pages carry
/// an image whose width encodes the marker. Either way the page's marker is
/// written back out as the width of its raster, so page order can be traced
/// through every stage.
pub struct MarkerRasterizer;

impl Rasterizer for MarkerRasterizer {
    fn name(&self) -> &str {
        "marker"
    }

    fn rasterize(&self, pdf: &Path, _dpi: u32, output_dir: &Path) -> Result<Vec<PageImage>> {
        let doc = Document::load(pdf)
            .map_err(|err| PressguardError::PdfError(format!("{}: {err}", pdf.display())))?;
        fs::create_dir_all(output_dir)?;

        let mut pages = Vec::new();
        for (index, page_id) in doc.get_pages().into_values().enumerate() {
            let marker = content_marker(&doc, page_id)
                .or_else(|| image_width(&doc, page_id).map(|width| (width - BASE_WIDTH) as usize))
                .ok_or_else(|| {
                    PressguardError::Rasterization(format!("page {index} carries no marker"))
                })?;
            let path = output_dir.join(page_file_name(index, "png"));
            RgbImage::from_pixel(BASE_WIDTH + marker as u32, RASTER_HEIGHT, Rgb([220, 220, 220]))
                .save(&path)
                .map_err(|err| PressguardError::ImageError(err.to_string()))?;
            pages.push(PageImage { index, path });
        }
        Ok(pages)
    }
}

fn content_marker(doc: &Document, page_id: ObjectId) -> Option<usize> {
    let content = doc.get_page_content(page_id).ok()?;
    let text = String::from_utf8_lossy(&content);
    let rest = text.split("% marker ").nth(1)?;
    rest.split_whitespace().next()?.parse().ok()
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Width of the first image XObject reachable from the page resources.
fn image_width(doc: &Document, page_id: ObjectId) -> Option<u32> {
    let page = doc.get_dictionary(page_id).ok()?;
    let resources = resolve(doc, page.get(b"Resources").ok()?)?.as_dict().ok()?;
    image_in_resources(doc, resources, 0)
}

fn image_in_resources(doc: &Document, resources: &lopdf::Dictionary, depth: usize) -> Option<u32> {
    if depth > 4 {
        return None;
    }
    let xobjects = resolve(doc, resources.get(b"XObject").ok()?)?.as_dict().ok()?;
    for (_, value) in xobjects.iter() {
        let Some(Object::Stream(stream)) = resolve(doc, value) else {
            continue;
        };
        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => {
                let width = stream.dict.get(b"Width").and_then(Object::as_i64).ok()?;
                return u32::try_from(width).ok();
            }
            Ok(b"Form") => {
                let nested = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|object| resolve(doc, object))
                    .and_then(|object| object.as_dict().ok());
                if let Some(width) = nested.and_then(|res| image_in_resources(doc, res, depth + 1)) {
                    return Some(width);
                }
            }
            _ => {}
        }
    }
    None
}

/// Markers of every page of a recomposed document, in page order.
pub fn page_markers(path: &Path) -> Vec<usize> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|page_id| (image_width(&doc, page_id).unwrap() - BASE_WIDTH) as usize)
        .collect()
}

/// Portrait A4 source document, one page per marker.
pub fn marker_pdf(path: &Path, markers: &[usize]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for &marker in markers {
        let content = Content {
            operations: vec![
                Operation::new("re", vec![72.into(), 72.into(), 200.into(), 100.into()]),
                Operation::new("f", vec![]),
            ],
        };
        let mut bytes = format!("% marker {marker}\n").into_bytes();
        bytes.extend(content.encode().unwrap());
        let content_id = doc.add_object(Stream::new(dictionary! {}, bytes));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => markers.len() as i64,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// One-page landscape A4 watermark with a grey band.
pub fn watermark_pdf(path: &Path) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content = Content {
        operations: vec![
            Operation::new("g", vec![Object::Real(0.6)]),
            Operation::new("re", vec![0.into(), 280.into(), 842.into(), 40.into()]),
            Operation::new("f", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), 842.into(), 595.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    doc.save(path).unwrap();
}

/// Folder layout under `root` plus the classic settings: 100 dpi, 5x5
/// kernel, sigma 0.5, fixed seed.
pub fn test_config(root: &Path) -> PipelineConfig {
    let watermark = root.join("watermarks").join("landscape_A4.pdf");
    watermark_pdf(&watermark);
    let input_dir = root.join("input");
    fs::create_dir_all(&input_dir).unwrap();

    let mut config = PipelineConfig {
        input_dir,
        output_dir: root.join("output"),
        tmp_dir: root.join("tmp"),
        processed_dir: root.join("processed"),
        watermark: Some(watermark),
        dpi: 100,
        kernel: KernelSize::square(5),
        sigma: 0.5,
        seed: Some(7),
        cleanup: CleanupConfig::default(),
        ..PipelineConfig::default()
    };
    config.encryption.owner_password = "owner-secret".into();
    config
}

/// File names directly inside `dir`, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn input_path(config: &PipelineConfig, name: &str) -> PathBuf {
    config.input_dir.join(name)
}
