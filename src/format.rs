//! Report formatters for MISP records.
//!
//! Pure text builders: no I/O, no mutation, and no failure path. A missing
//! optional field renders a documented placeholder ("unknown", "N/A", "None")
//! instead of erroring out, so every tool invocation can return a complete
//! string even over partially filled records.

use serde_json::json;

use crate::misp::models::{
    analysis_name, distribution_name, threat_level_name, Attribute, ConnectionStatus, Event, Feed,
    VersionInfo,
};

/// Attributes shown inline in an event detail report before truncation.
const EVENT_REPORT_ATTRIBUTE_LIMIT: usize = 10;

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn enabled_disabled(value: bool) -> &'static str {
    if value {
        "Enabled"
    } else {
        "Disabled"
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "unknown"
    } else {
        value
    }
}

pub fn connection_report(status: &ConnectionStatus, server_url: &str, verify_ssl: bool) -> String {
    match status {
        ConnectionStatus::Connected {
            version,
            client_version,
        } => format!(
            "Successfully connected to MISP instance.\n\n\
             Connection Details:\n\
             - Status: connected\n\
             - MISP Version: {}\n\
             - Client Version: {}\n\
             - Server URL: {}\n\
             - SSL Verification: {}",
            or_unknown(version),
            client_version,
            server_url,
            enabled_disabled(verify_ssl)
        ),
        ConnectionStatus::Error { message } => format!(
            "Failed to connect to MISP instance.\n\n\
             Error Details:\n\
             - Status: error\n\
             - Message: {}\n\
             - Server URL: {}\n\n\
             Please check your MISP_URL and MISP_API_KEY configuration.",
            message, server_url
        ),
    }
}

pub fn version_report(version_info: &VersionInfo, server_url: &str, verify_ssl: bool) -> String {
    format!(
        "MISP Version Information:\n\n\
         Core Versions:\n\
         - MISP Version: {}\n\
         - Application: {}\n\
         - API Version: {}\n\n\
         Loaded Components:\n\
         - Modules: {} available\n\
         - Taxonomies: {} loaded\n\
         - Galaxy Clusters: {} available\n\n\
         Server Information:\n\
         - URL: {}\n\
         - SSL Verification: {}",
        or_unknown(&version_info.version),
        version_info.application.as_deref().unwrap_or("unknown"),
        version_info.api_version.as_deref().unwrap_or("unknown"),
        version_info.modules.len(),
        version_info.taxonomies.len(),
        version_info.galaxy_clusters.len(),
        server_url,
        enabled_disabled(verify_ssl)
    )
}

pub fn created_event_report(event: &Event) -> String {
    format!(
        "Event created successfully.\n\n\
         Event Details:\n\
         - Event ID: {}\n\
         - UUID: {}\n\
         - Info: {}\n\
         - Distribution: {} ({})\n\
         - Threat Level: {} ({})\n\
         - Analysis: {} ({})\n\
         - Date: {}\n\
         - Created: {}\n\n\
         Next Steps:\n\
         Add indicators to this event with the add_misp_attribute tool using event ID {}.",
        event.id,
        event.uuid,
        event.info,
        event.distribution,
        distribution_name(event.distribution),
        event.threat_level_id,
        threat_level_name(event.threat_level_id),
        event.analysis,
        analysis_name(event.analysis),
        event.date,
        or_unknown(&event.timestamp),
        event.id
    )
}

pub fn event_report(event: &Event, include_attributes: bool) -> String {
    let mut output = format!(
        "Event Details:\n\n\
         Basic Information:\n\
         - Event ID: {}\n\
         - UUID: {}\n\
         - Info: {}\n\
         - Distribution: {} ({})\n\
         - Threat Level: {} ({})\n\
         - Analysis: {} ({})\n\
         - Date: {}\n\
         - Published: {}\n\
         - Modified: {}\n\n\
         Organization:\n\
         - Org ID: {}\n\
         - Orgc ID: {}",
        event.id,
        event.uuid,
        event.info,
        event.distribution,
        distribution_name(event.distribution),
        event.threat_level_id,
        threat_level_name(event.threat_level_id),
        event.analysis,
        analysis_name(event.analysis),
        event.date,
        yes_no(event.published),
        or_unknown(&event.timestamp),
        or_unknown(&event.org_id),
        or_unknown(&event.orgc_id)
    );

    if include_attributes && !event.attributes.is_empty() {
        output.push_str(&format!("\n\nAttributes ({}):", event.attributes.len()));
        for attribute in event.attributes.iter().take(EVENT_REPORT_ATTRIBUTE_LIMIT) {
            output.push_str(&format!(
                "\n- {}: {} (Category: {})",
                attribute.attribute_type, attribute.value, attribute.category
            ));
        }
        if event.attributes.len() > EVENT_REPORT_ATTRIBUTE_LIMIT {
            output.push_str(&format!(
                "\n... and {} more attributes",
                event.attributes.len() - EVENT_REPORT_ATTRIBUTE_LIMIT
            ));
        }
    }

    if !event.tags.is_empty() {
        output.push_str(&format!("\n\nTags ({}):", event.tags.len()));
        for tag in &event.tags {
            output.push_str(&format!("\n- {}", tag.name));
        }
    }

    output
}

pub fn search_results_report(events: &[Event], limit: usize) -> String {
    if events.is_empty() {
        return "No events found matching your search criteria.".to_string();
    }

    let mut output = format!("Found {} event(s):\n", events.len());
    for event in events {
        output.push_str(&format!(
            "\nEvent {} | {} | Threat: {} | Analysis: {} | Published: {} | Attributes: {} | {}",
            event.id,
            event.date,
            threat_level_name(event.threat_level_id),
            analysis_name(event.analysis),
            yes_no(event.published),
            event.attributes.len(),
            event.info
        ));
    }

    if events.len() == limit {
        output.push_str(&format!(
            "\n\nResults limited to {} events. Use more specific filters to narrow the search.",
            limit
        ));
    }

    output
}

pub fn created_attribute_report(attribute: &Attribute) -> String {
    let comment = if attribute.comment.is_empty() {
        "None"
    } else {
        attribute.comment.as_str()
    };
    format!(
        "Attribute added successfully.\n\n\
         Attribute Details:\n\
         - Attribute ID: {}\n\
         - Event ID: {}\n\
         - Type: {}\n\
         - Value: {}\n\
         - Category: {}\n\
         - To IDS: {}\n\
         - Distribution: {} ({})\n\
         - Comment: {}\n\
         - Created: {}\n\n\
         This attribute is now available for correlation and detection within MISP.",
        attribute.id,
        attribute.event_id,
        attribute.attribute_type,
        attribute.value,
        attribute.category,
        yes_no(attribute.to_ids),
        attribute.distribution,
        distribution_name(attribute.distribution),
        comment,
        or_unknown(&attribute.timestamp)
    )
}

/// Attribute listing grouped by category, in first-seen order. `shown` is the
/// already-filtered, already-limited set; `total` is the event's full
/// attribute count before filtering and limiting.
pub fn event_attributes_report(
    event_id: &str,
    event_info: &str,
    shown: &[&Attribute],
    total: usize,
) -> String {
    let mut output = format!(
        "Event {} Attributes ({} shown):\n\nEvent Info: {}\n",
        event_id,
        shown.len(),
        event_info
    );

    let mut categories: Vec<(&str, Vec<&Attribute>)> = Vec::new();
    for attribute in shown {
        match categories
            .iter_mut()
            .find(|(name, _)| *name == attribute.category.as_str())
        {
            Some((_, members)) => members.push(attribute),
            None => categories.push((attribute.category.as_str(), vec![attribute])),
        }
    }

    for (category, members) in &categories {
        output.push_str(&format!("\n{} ({}):", category, members.len()));
        for attribute in members {
            let marker = if attribute.to_ids { "[IDS]" } else { "[info]" };
            output.push_str(&format!(
                "\n  {} {}: {}",
                marker, attribute.attribute_type, attribute.value
            ));
            if !attribute.comment.is_empty() {
                output.push_str(&format!(" ({})", attribute.comment));
            }
        }
    }

    if total > shown.len() {
        output.push_str(&format!(
            "\n\nShowing {} of {} total attributes. Use filters or a higher limit to see more.",
            shown.len(),
            total
        ));
    }

    output.push_str(
        "\n\nLegend:\n[IDS] = detection eligible\n[info] = informational only",
    );
    output
}

/// JSON report of recent events, sorted by timestamp descending, with
/// aggregate counts by threat level and completed analysis.
pub fn recent_events_report(days: u32, date_from: &str, date_to: &str, events: &[Event]) -> String {
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let event_entries: Vec<serde_json::Value> = sorted
        .iter()
        .map(|event| {
            json!({
                "id": event.id,
                "uuid": event.uuid,
                "info": event.info,
                "date": event.date,
                "threat_level": {
                    "id": event.threat_level_id,
                    "name": threat_level_name(event.threat_level_id),
                },
                "analysis": {
                    "id": event.analysis,
                    "name": analysis_name(event.analysis),
                },
                "distribution": {
                    "id": event.distribution,
                    "name": distribution_name(event.distribution),
                },
                "published": event.published,
                "attribute_count": event.attributes.len(),
                "timestamp": event.timestamp,
                "org_id": event.org_id,
                "orgc_id": event.orgc_id,
            })
        })
        .collect();

    let count_threat = |level: u8| sorted.iter().filter(|e| e.threat_level_id == level).count();

    let mut report = json!({
        "timeframe": format!("Last {} days", days),
        "date_from": date_from,
        "date_to": date_to,
        "count": sorted.len(),
        "events": event_entries,
        "summary": {
            "total_events": sorted.len(),
            "published_events": sorted.iter().filter(|e| e.published).count(),
            "high_threat": count_threat(1),
            "medium_threat": count_threat(2),
            "low_threat": count_threat(3),
            "completed_analysis": sorted.iter().filter(|e| e.analysis == 2).count(),
        },
    });
    if sorted.is_empty() {
        report["message"] = json!("No events found in the specified timeframe");
    }

    serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
}

pub fn feeds_report(feeds: &[Feed]) -> String {
    let mut output = "MISP Feed Information:\n\n".to_string();

    let (enabled, disabled): (Vec<&Feed>, Vec<&Feed>) =
        feeds.iter().partition(|feed| feed.enabled);

    for feed in &enabled {
        output.push_str(&format!("Name: {}\n", feed.name));
        output.push_str(&format!("Provider: {}\n", or_unknown(&feed.provider)));
        output.push_str(&format!(
            "Source Format: {}\n",
            feed.source_format.as_deref().unwrap_or("unknown")
        ));
        output.push_str(&format!(
            "URL: {}\n",
            if feed.url.is_empty() { "N/A" } else { &feed.url }
        ));
        output.push_str(&format!(
            "Input Source: {}\n",
            feed.input_source.as_deref().unwrap_or("unknown")
        ));
        output.push_str(&format!("Enabled: {}\n", yes_no(feed.enabled)));
        output.push_str(&format!(
            "Caching Enabled: {}\n",
            yes_no(feed.caching_enabled)
        ));
        if let Some(description) = feed.description.as_deref().filter(|d| !d.is_empty()) {
            output.push_str(&format!("Description: {}\n", description));
        }
        output.push_str("\n---\n\n");
    }

    output.push_str("Summary:\n");
    output.push_str(&format!("- Total Feeds: {}\n", feeds.len()));
    output.push_str(&format!("- Enabled Feeds: {}\n", enabled.len()));
    output.push_str(&format!("- Disabled Feeds: {}\n", disabled.len()));

    output
}
