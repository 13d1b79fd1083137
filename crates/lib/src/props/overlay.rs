//! Conditional property overlays such as `arch: { arm64 = {...} }` or
//! `target: { vendor = {...} }`.

use super::value::{PropertyError, PropertyKind, PropertyMap, PropertyMapExt, PropertyValue, merge_maps};

/// Collect the overlays found at `paths` into one patch, in order.
///
/// Later paths win on scalar conflicts. Missing paths are skipped; a path
/// that exists but is not a map is an error.
pub fn collect_overlays(props: &PropertyMap, paths: &[String]) -> Result<PropertyMap, PropertyError> {
  let mut patch = PropertyMap::new();
  for path in paths {
    match props.lookup(path) {
      None => {}
      Some(PropertyValue::Map(overlay)) => merge_maps(&mut patch, overlay, "")?,
      Some(value) if value.is_empty_container() => {}
      Some(value) => {
        return Err(PropertyError::WrongKind {
          path: path.clone(),
          expected: PropertyKind::Map,
          found: value.kind(),
        });
      }
    }
  }
  Ok(patch)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::props;
  use serde_json::json;

  #[test]
  fn overlays_apply_in_order() {
    let props = props(json!({
      "arch": {"arm64": {"srcs": ["arm64.c"], "stem": "arch"}},
      "target": {
        "android": {"srcs": ["android.c"]},
        "android_arm64": {"stem": "combined"}
      }
    }));
    let paths = vec![
      "arch.arm64".to_string(),
      "multilib.lib64".to_string(),
      "target.android".to_string(),
      "target.android_arm64".to_string(),
    ];
    let patch = collect_overlays(&props, &paths).unwrap();
    assert_eq!(patch.strings("srcs"), ["arm64.c", "android.c"]);
    assert_eq!(patch.string("stem"), Some("combined"));
  }

  #[test]
  fn non_map_overlay_is_an_error() {
    let props = props(json!({"target": {"vendor": true}}));
    let err = collect_overlays(&props, &["target.vendor".to_string()]).unwrap_err();
    assert!(err.to_string().contains("target.vendor"));
  }
}
