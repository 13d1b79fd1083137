//! `defaults` inheritance.
//!
//! A module lists defaults modules in its `defaults` property. Their
//! properties are merged first, in listed order, and the module's own
//! properties are merged on top. Defaults modules may themselves list
//! defaults.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use super::value::{PropertyError, PropertyMap, PropertyMapExt, merge_maps};

pub const DEFAULTS_PROPERTY: &str = "defaults";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefaultsError {
  #[error("module \"{module}\": defaults module \"{defaults}\" is not defined")]
  Missing { module: String, defaults: String },

  #[error("module \"{module}\": \"{defaults}\" is not a defaults module")]
  NotDefaults { module: String, defaults: String },

  #[error("cyclic defaults: {}", chain.join(" -> "))]
  Cycle { chain: Vec<String> },

  #[error("module \"{module}\": {source}")]
  Property {
    module: String,
    #[source]
    source: PropertyError,
  },
}

/// One module as seen by the defaults resolver.
#[derive(Debug, Clone)]
pub struct DefaultsDecl {
  pub is_defaults: bool,
  pub props: PropertyMap,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
  Visiting,
  Done,
}

/// Resolve `defaults` for every declared module.
///
/// Returns the merged property bag of each module whose chain resolved,
/// together with every error encountered. The `defaults` property itself is
/// removed from the result.
pub fn resolve_defaults(decls: &BTreeMap<String, DefaultsDecl>) -> (BTreeMap<String, PropertyMap>, Vec<DefaultsError>) {
  let mut resolver = Resolver {
    decls,
    state: HashMap::new(),
    resolved: BTreeMap::new(),
    errors: Vec::new(),
    stack: Vec::new(),
  };
  for name in decls.keys() {
    resolver.visit(name);
  }
  (resolver.resolved, resolver.errors)
}

struct Resolver<'a> {
  decls: &'a BTreeMap<String, DefaultsDecl>,
  state: HashMap<&'a str, State>,
  resolved: BTreeMap<String, PropertyMap>,
  errors: Vec<DefaultsError>,
  stack: Vec<&'a str>,
}

impl<'a> Resolver<'a> {
  /// Returns false when `name` (or anything it inherits from) failed.
  fn visit(&mut self, name: &'a str) -> bool {
    match self.state.get(name) {
      Some(State::Done) => return self.resolved.contains_key(name),
      Some(State::Visiting) => {
        let start = self.stack.iter().position(|n| *n == name).unwrap_or(0);
        let mut chain: Vec<String> = self.stack[start..].iter().map(|n| n.to_string()).collect();
        chain.push(name.to_string());
        self.errors.push(DefaultsError::Cycle { chain });
        return false;
      }
      None => {}
    }

    let decls = self.decls;
    let Some(decl) = decls.get(name) else {
      return false;
    };

    self.state.insert(name, State::Visiting);
    self.stack.push(name);

    let mut merged = PropertyMap::new();
    let mut ok = true;
    for defaults in decl.props.strings(DEFAULTS_PROPERTY) {
      let Some((key, target)) = decls.get_key_value(defaults.as_str()) else {
        self.errors.push(DefaultsError::Missing {
          module: name.to_string(),
          defaults: defaults.clone(),
        });
        ok = false;
        continue;
      };
      if !target.is_defaults {
        self.errors.push(DefaultsError::NotDefaults {
          module: name.to_string(),
          defaults: defaults.clone(),
        });
        ok = false;
        continue;
      }
      if !self.visit(key.as_str()) {
        ok = false;
        continue;
      }
      if let Some(inherited) = self.resolved.get(key.as_str())
        && let Err(source) = merge_maps(&mut merged, inherited, "")
      {
        self.errors.push(DefaultsError::Property {
          module: name.to_string(),
          source,
        });
        ok = false;
      }
    }

    let mut own = decl.props.clone();
    own.remove(DEFAULTS_PROPERTY);
    if ok && let Err(source) = merge_maps(&mut merged, &own, "") {
      self.errors.push(DefaultsError::Property {
        module: name.to_string(),
        source,
      });
      ok = false;
    }

    self.stack.pop();
    self.state.insert(name, State::Done);
    if ok {
      trace!(module = name, "resolved defaults");
      self.resolved.insert(name.to_string(), merged);
    }
    ok
  }
}
