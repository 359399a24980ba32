//! Property diffing
//!
//! [`diff_props`] turns a pair of prop bags into the ordered list of host
//! mutations that moves an output node from one to the other. The list is
//! emitted in four passes:
//!
//! 1. detach listeners that were removed or replaced
//! 2. clear attributes that were removed
//! 3. set attributes that were added or changed (`style` per property,
//!    `class` per token)
//! 4. attach listeners that were added or replaced

use std::fmt;
use std::sync::Arc;

use crate::element::{event_name, EventHandler, PropValue, Props};

/// One host mutation produced by [`diff_props`].
pub enum PropPatch<'a> {
    RemoveListener {
        event: String,
        handler: &'a EventHandler,
    },
    ClearAttribute {
        name: &'a str,
    },
    SetAttribute {
        name: &'a str,
        value: &'a PropValue,
    },
    SetStyle {
        property: &'a str,
        value: Option<&'a str>,
    },
    SetClass {
        class: &'a str,
        enabled: bool,
    },
    AddListener {
        event: String,
        handler: &'a EventHandler,
    },
}

impl fmt::Debug for PropPatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoveListener { event, handler } => {
                write!(f, "RemoveListener({event}, <handler {:p}>)", Arc::as_ptr(handler) as *const ())
            }
            Self::ClearAttribute { name } => write!(f, "ClearAttribute({name})"),
            Self::SetAttribute { name, value } => write!(f, "SetAttribute({name}, {value:?})"),
            Self::SetStyle { property, value } => write!(f, "SetStyle({property}, {value:?})"),
            Self::SetClass { class, enabled } => write!(f, "SetClass({class}, {enabled})"),
            Self::AddListener { event, handler } => {
                write!(f, "AddListener({event}, <handler {:p}>)", Arc::as_ptr(handler) as *const ())
            }
        }
    }
}

pub(crate) fn is_class_prop(name: &str) -> bool {
    name == "class" || name == "className"
}

fn attribute<'a>(props: &'a Props, name: &str) -> Option<&'a PropValue> {
    props.get(name).filter(|v| !v.is_handler())
}

fn same_shape(a: &PropValue, b: &PropValue) -> bool {
    matches!(a, PropValue::Style(_)) == matches!(b, PropValue::Style(_))
}

/// Compute the ordered mutations that turn `prev` into `next`.
pub fn diff_props<'a>(prev: &'a Props, next: &'a Props) -> Vec<PropPatch<'a>> {
    let mut patches = Vec::new();

    // Pass 1: listeners that disappeared or changed identity.
    for (name, value) in prev.iter() {
        let PropValue::Handler(handler) = value else {
            continue;
        };
        let unchanged = next.get(name).is_some_and(|n| n.same_value(value));
        if unchanged {
            continue;
        }
        if let Some(event) = event_name(name) {
            patches.push(PropPatch::RemoveListener { event, handler });
        }
    }

    // Pass 2: attributes that disappeared, or switched between style and scalar.
    for (name, value) in prev.iter() {
        if value.is_handler() {
            continue;
        }
        match attribute(next, name) {
            Some(n) if same_shape(value, n) => {}
            _ => patches.push(PropPatch::ClearAttribute { name }),
        }
    }

    // Pass 3: attributes that were added or changed.
    for (name, value) in next.iter() {
        if value.is_handler() {
            continue;
        }
        let old = attribute(prev, name).filter(|o| same_shape(o, value));
        if old.is_some_and(|o| o.same_value(value)) {
            continue;
        }
        match (old, value) {
            (Some(PropValue::Style(old_map)), PropValue::Style(new_map)) => {
                for property in old_map.keys() {
                    if !new_map.contains_key(property) {
                        patches.push(PropPatch::SetStyle {
                            property,
                            value: None,
                        });
                    }
                }
                for (property, v) in new_map {
                    if old_map.get(property) != Some(v) {
                        patches.push(PropPatch::SetStyle {
                            property,
                            value: Some(v.as_str()),
                        });
                    }
                }
            }
            (Some(PropValue::Str(old_classes)), PropValue::Str(new_classes))
                if is_class_prop(name) =>
            {
                let before: Vec<&str> = old_classes.split_whitespace().collect();
                let after: Vec<&str> = new_classes.split_whitespace().collect();
                for &class in &before {
                    if !after.contains(&class) {
                        patches.push(PropPatch::SetClass {
                            class,
                            enabled: false,
                        });
                    }
                }
                for &class in &after {
                    if !before.contains(&class) {
                        patches.push(PropPatch::SetClass {
                            class,
                            enabled: true,
                        });
                    }
                }
            }
            _ => patches.push(PropPatch::SetAttribute { name, value }),
        }
    }

    // Pass 4: listeners that appeared or changed identity.
    for (name, value) in next.iter() {
        let PropValue::Handler(handler) = value else {
            continue;
        };
        let unchanged = prev.get(name).is_some_and(|p| p.same_value(value));
        if unchanged {
            continue;
        }
        if let Some(event) = event_name(name) {
            patches.push(PropPatch::AddListener { event, handler });
        }
    }

    patches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn describe(patches: &[PropPatch<'_>]) -> Vec<String> {
        patches
            .iter()
            .map(|p| match p {
                PropPatch::RemoveListener { event, .. } => format!("-on:{event}"),
                PropPatch::ClearAttribute { name } => format!("-{name}"),
                PropPatch::SetAttribute { name, value } => {
                    format!("+{name}={}", value.to_attribute().unwrap_or_default())
                }
                PropPatch::SetStyle { property, value } => {
                    format!("style.{property}={}", value.unwrap_or("<none>"))
                }
                PropPatch::SetClass { class, enabled } => {
                    format!("{}{class}", if *enabled { "+." } else { "-." })
                }
                PropPatch::AddListener { event, .. } => format!("+on:{event}"),
            })
            .collect()
    }

    #[test]
    fn passes_run_in_order() {
        let prev = Props::new()
            .attr("title", "old")
            .attr("hidden", true)
            .on("click", |_| {});
        let next = Props::new().attr("title", "new").on("click", |_| {});

        assert_eq!(
            describe(&diff_props(&prev, &next)),
            vec!["-on:click", "-hidden", "+title=new", "+on:click"]
        );
    }

    #[test]
    fn identical_props_produce_nothing() {
        let handler: EventHandler = Arc::new(|_| {});
        let prev = Props::new().attr("id", "a").handler("input", handler.clone());
        let next = Props::new().attr("id", "a").handler("input", handler);
        assert!(diff_props(&prev, &next).is_empty());
    }

    #[test]
    fn style_is_merged_per_property() {
        let prev = Props::new().style("color", "red").style("margin", "0");
        let next = Props::new().style("color", "blue").style("padding", "1px");
        assert_eq!(
            describe(&diff_props(&prev, &next)),
            vec!["style.margin=<none>", "style.color=blue", "style.padding=1px"]
        );
    }

    #[test]
    fn class_is_merged_per_token() {
        let prev = Props::new().attr("class", "btn active");
        let next = Props::new().attr("class", "btn primary");
        assert_eq!(
            describe(&diff_props(&prev, &next)),
            vec!["-.active", "+.primary"]
        );
    }

    #[test]
    fn switching_style_to_string_clears_first() {
        let prev = Props::new().style("color", "red");
        let next = Props::new().attr("style", "color: blue");
        assert_eq!(
            describe(&diff_props(&prev, &next)),
            vec!["-style", "+style=color: blue"]
        );
    }

    #[test]
    fn debug_output_hides_handler_bodies() {
        let prev = Props::new().attr("id", "a");
        let next = Props::new().on("click", |_| {});
        let rendered: Vec<String> = diff_props(&prev, &next)
            .iter()
            .map(|patch| format!("{patch:?}"))
            .collect();
        assert_eq!(rendered[0], "ClearAttribute(id)");
        assert!(rendered[1].starts_with("AddListener(click, <handler 0x"));
    }
}
