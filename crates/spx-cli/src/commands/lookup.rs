//! `spx visible` and `spx beans`.

use anyhow::{bail, Context, Result};
use spx_config::{BeanConfig, ConverterLookup, ValueType};
use spx_realm::{enter_realm, BeanEntry, RealmFilteredBeans, VisibilityResolver};

use super::Container;

/// Execute `spx visible`: one realm name per line, sorted.
pub fn visible(config_paths: &[String], realm: Option<String>) -> Result<()> {
    let container = Container::load(config_paths)?;
    let Some(realm) = container.pick_realm(realm) else {
        bail!("no realm given: pass --realm or set context_realm in config");
    };

    for name in container.registry.visible_realm_names(&realm).iter() {
        println!("{name}");
    }
    Ok(())
}

/// Execute `spx beans`: `<name>\t<source>[\t<value>]` per visible bean.
pub fn beans(config_paths: &[String], realm: Option<String>) -> Result<()> {
    let container = Container::load(config_paths)?;
    let converters = ConverterLookup::default();

    let entries = container
        .config
        .beans
        .iter()
        .map(|b| to_entry(b, &converters))
        .collect::<Result<Vec<_>>>()?;

    let view = RealmFilteredBeans::new(entries.iter(), &container.registry);

    let _guard = container.pick_realm(realm).map(enter_realm);
    for bean in &view {
        match &bean.value {
            Some(v) => println!("{}\t{}\t{}", bean.name, bean.source, v),
            None => println!("{}\t{}", bean.name, bean.source),
        }
    }
    Ok(())
}

/// Build a bean entry, converting typed values up front so a bad literal
/// fails the whole listing.
fn to_entry(bean: &BeanConfig, converters: &ConverterLookup) -> Result<BeanEntry<Option<String>>> {
    let text = bean.value_text();
    let value = match (&bean.value_type, text) {
        (Some(ty), Some(text)) => {
            let ty: ValueType = ty
                .parse()
                .with_context(|| format!("bean '{}'", bean.name))?;
            let converted = converters
                .convert(ty, &text)
                .with_context(|| format!("bean '{}'", bean.name))?;
            Some(converted.to_string())
        }
        (_, text) => text,
    };
    Ok(BeanEntry::new(
        bean.name.as_str(),
        bean.source.as_str(),
        value,
    ))
}
