use glam::Vec4;
use log::debug;

use crate::diag::Diagnostics;
use crate::document::{ColorOrTexture, Document, EffectPass, FloatOrParam, ShaderClass};
use crate::output::{ChannelValue, MaterialPass, ResolvedMaterial, ShadingMode};

/// Joins stored materials with their effects and maps the shading parameters
/// onto target-engine material passes. A material whose effect is missing is
/// skipped with a diagnostic; the rest of the run is unaffected.
pub fn resolve_materials(doc: &Document, diag: &Diagnostics) -> Vec<ResolvedMaterial> {
    let workarounds = transparency_workarounds(doc.asset().authoring_tool.as_deref());
    let mut resolved = Vec::with_capacity(doc.materials().len());
    for material in doc.materials() {
        let Some(effect) = doc.find_effect(&material.effect) else {
            diag.warn(format!(
                "could not find effect '{}' for material '{}' in storage",
                material.effect, material.name
            ));
            continue;
        };
        let passes = effect
            .passes
            .iter()
            .map(|pass| resolve_pass(pass, &material.effect, workarounds, doc, diag))
            .collect();
        resolved.push(ResolvedMaterial {
            name: material.name.clone(),
            two_sided: doc.is_double_sided(&material.effect),
            passes,
        });
    }
    resolved
}

fn resolve_pass(
    source: &EffectPass,
    effect_id: &str,
    workarounds: bool,
    doc: &Document,
    diag: &Diagnostics,
) -> MaterialPass {
    let mut pass = MaterialPass::default();

    pass.shading = match source.shader {
        ShaderClass::Blinn | ShaderClass::Phong => ShadingMode::Phong,
        ShaderClass::Constant | ShaderClass::Lambert => ShadingMode::Gouraud,
        ShaderClass::Other => {
            diag.warn(format!("unknown shader type for effect '{effect_id}'"));
            ShadingMode::Gouraud
        }
    };

    pass.ambient = resolve_channel(&source.ambient, doc, diag);
    pass.diffuse = resolve_channel(&source.diffuse, doc, diag);
    pass.specular = resolve_channel(&source.specular, doc, diag);
    pass.emissive = resolve_channel(&source.emissive, doc, diag);

    if let Some(FloatOrParam::Float(shininess)) = source.shininess {
        pass.shininess = Some(shininess);
    }

    let opacity = match &source.opacity {
        Some(ColorOrTexture::Color(color)) => {
            let mut opacity = *color;
            // some exporters write transparency inverted
            if workarounds {
                opacity = Vec4::ONE - opacity;
            }
            Some(opacity)
        }
        _ => None,
    };

    match opacity {
        Some(opacity) if opacity.x < 1.0 || opacity.y < 1.0 || opacity.z < 1.0 => {
            // constant diffuse keeps its color with a modulated alpha;
            // textured diffuse takes the precalculated opacity color directly
            pass.diffuse = match pass.diffuse {
                Some(ChannelValue::Color(diffuse)) => Some(ChannelValue::Color(Vec4::new(
                    diffuse.x,
                    diffuse.y,
                    diffuse.z,
                    opacity.w * diffuse.w,
                ))),
                _ => Some(ChannelValue::Color(opacity)),
            };
            pass.alpha_blend = true;
            pass.depth_write = false;
        }
        _ => {
            if matches!(source.opacity, Some(ColorOrTexture::Texture { .. })) {
                diag.warn(format!(
                    "effect '{effect_id}' has an opacity texture, which is presently unsupported"
                ));
            }
        }
    }

    pass
}

fn resolve_channel(
    channel: &Option<ColorOrTexture>,
    doc: &Document,
    diag: &Diagnostics,
) -> Option<ChannelValue> {
    match channel {
        None => None,
        Some(ColorOrTexture::Color(color)) => Some(ChannelValue::Color(*color)),
        Some(ColorOrTexture::Texture { image }) => match doc.texture_name(image) {
            Some(texture) => Some(ChannelValue::Texture(texture.to_string())),
            None => {
                diag.warn(format!("could not find image '{image}' for texture"));
                None
            }
        },
    }
}

/// Detects authoring tools with known inverted-transparency export bugs:
/// Google SketchUp before 7.1 and the (unversioned) FBX exporter.
pub fn transparency_workarounds(authoring_tool: Option<&str>) -> bool {
    let Some(tool) = authoring_tool else {
        return false;
    };
    if tool == "FBX COLLADA exporter" {
        return true;
    }
    if let Some(buggy) = sketchup_before_7_1(tool) {
        if buggy {
            debug!("enabling transparency workarounds for '{tool}'");
        }
        return buggy;
    }
    false
}

/// Matches "Google SketchUp <major>.<minor>[.<patch>]" and reports whether
/// the version predates 7.1.
fn sketchup_before_7_1(tool: &str) -> Option<bool> {
    let version = tool.strip_prefix("Google SketchUp ")?;
    let mut parts = version.split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next()?.parse().ok()?;
    if let Some(patch) = parts.next() {
        patch.parse::<u32>().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(major < 7 || (major == 7 && minor < 1))
}
