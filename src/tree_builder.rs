//! Builds the deduplicated category tree and the content leaves from a dataset.
//!
//! Children are aggregated across the whole dataset: a node's children are every
//! distinct value seen in the next level column on any row that carries the
//! node's name at its level. The aggregation is precomputed once per level and
//! then looked up while walking rows.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::schema::{CategoryLevel, CategoryNode, ContentLeaf, HierarchyLevel, ListModel};
use crate::sheet_parser::{Dataset, Row};

/// Names of the non-level columns read from every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentColumns {
    pub id: String,
    pub label: String,
    pub control: String,
    pub values: String,
}

impl Default for ContentColumns {
    fn default() -> Self {
        Self {
            id: "ID".to_string(),
            label: "Content".to_string(),
            control: "Control".to_string(),
            values: "Values".to_string(),
        }
    }
}

/// Column positions for [`ContentColumns`]; a column missing from the header reads as absent.
struct ContentIndices {
    id: Option<usize>,
    label: Option<usize>,
    control: Option<usize>,
    values: Option<usize>,
}

impl ContentIndices {
    fn resolve(dataset: &Dataset, columns: &ContentColumns) -> Self {
        Self {
            id: dataset.column(&columns.id),
            label: dataset.column(&columns.label),
            control: dataset.column(&columns.control),
            values: dataset.column(&columns.values),
        }
    }
}

/// value → distinct next-level values, first-seen order.
type Adjacency<'a> = HashMap<&'a str, Vec<&'a str>>;

/// Build the category model and the content model in one call.
pub fn build(dataset: &Dataset, levels: &[HierarchyLevel], columns: &ContentColumns) -> ListModel {
    let adjacency = aggregate_children(dataset, levels);
    let categories = build_categories(dataset, levels, &adjacency, columns);
    let content = build_content(dataset, levels, columns);

    info!(
        "Built list model for '{}': {} levels, {} nodes, {} content leaves",
        dataset.name,
        categories.len(),
        categories.iter().map(|c| c.nodes.len()).sum::<usize>(),
        content.len()
    );

    ListModel { categories, content }
}

/// One pass over the dataset collecting, per level, each value's children.
fn aggregate_children<'a>(dataset: &'a Dataset, levels: &[HierarchyLevel]) -> Vec<Adjacency<'a>> {
    let mut tables: Vec<Adjacency<'a>> = vec![HashMap::new(); levels.len()];

    for row in dataset.rows() {
        for (i, pair) in levels.windows(2).enumerate() {
            let Some(name) = row.cell(pair[0].index) else {
                continue;
            };
            let children = tables[i].entry(name).or_default();
            if let Some(child) = row.cell(pair[1].index) {
                if !children.contains(&child) {
                    children.push(child);
                }
            }
        }
    }

    tables
}

fn build_categories(
    dataset: &Dataset,
    levels: &[HierarchyLevel],
    adjacency: &[Adjacency<'_>],
    columns: &ContentColumns,
) -> Vec<CategoryLevel> {
    let id_column = dataset.column(&columns.id);
    let mut collections: Vec<Vec<CategoryNode>> = vec![Vec::new(); levels.len()];

    for row in dataset.rows() {
        for (i, level) in levels.iter().enumerate() {
            let Some(name) = row.cell(level.index) else {
                continue;
            };
            let parent = i
                .checked_sub(1)
                .and_then(|p| row.cell(levels[p].index))
                .map(String::from);
            let children = adjacency[i]
                .get(name)
                .map(|c| c.iter().map(|s| s.to_string()).collect())
                .unwrap_or_default();

            let candidate = CategoryNode {
                level: level.number,
                name: name.to_string(),
                parent,
                children,
                source_id: row.cell_opt(id_column).map(String::from),
            };
            record(&mut collections[i], candidate);
        }
    }

    levels
        .iter()
        .zip(collections)
        .map(|(level, nodes)| {
            debug!("Level {} ({}): {} nodes", level.number, level.column, nodes.len());
            CategoryLevel {
                level: level.number,
                column: level.column.clone(),
                nodes,
            }
        })
        .collect()
}

/// Append `candidate` unless the level already holds it. A name seen earlier
/// under a different parent keeps its first observation.
fn record(nodes: &mut Vec<CategoryNode>, candidate: CategoryNode) {
    match nodes.iter().find(|n| n.name == candidate.name) {
        None => nodes.push(candidate),
        Some(existing) if *existing == candidate => {}
        Some(existing) => warn!(
            "Level {}: '{}' already recorded under parent {:?}, ignoring parent {:?} (row {:?})",
            candidate.level, candidate.name, existing.parent, candidate.parent, candidate.source_id
        ),
    }
}

fn build_content(dataset: &Dataset, levels: &[HierarchyLevel], columns: &ContentColumns) -> Vec<ContentLeaf> {
    let indices = ContentIndices::resolve(dataset, columns);
    dataset
        .rows()
        .map(|row| content_leaf(&row, levels, &indices))
        .collect()
}

fn content_leaf(row: &Row<'_>, levels: &[HierarchyLevel], indices: &ContentIndices) -> ContentLeaf {
    // Deepest filled level wins, not the first.
    let anchor = levels
        .iter()
        .filter_map(|level| row.cell(level.index).map(|label| (label, level.number)))
        .last();

    ContentLeaf {
        id: row.cell_opt(indices.id).map(String::from),
        label: row.cell_opt(indices.label).map(String::from),
        control: row.cell_opt(indices.control).map(String::from),
        values: row.cell_opt(indices.values).map(String::from),
        parent_label: anchor.map(|(label, _)| label.to_string()),
        parent_level: anchor.map(|(_, number)| number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{compile_pattern, discover_levels, DEFAULT_LEVEL_PATTERN};
    use crate::sheet_parser::parse_text;

    const MENU_CSV: &str = "ID,L1,L2,L3,L4,L5,L6,L7,Content,Control,Values,End Point Needed,Path Needed\n\
        2.02.03.02.01.01,All Settings,Features,Media,DAB,TBD,,,TBD,,TBD,,TRUE\n\
        2.02.03.01.03,All Settings,Features,Media,AM-FM-HD Radio,,,,Station List Order,,ABC/123,TRUE,TRUE\n\
        3.02,Climate Settings,,,,,,,Auto Front Heater,,On/Off,TRUE,TRUE";

    fn build_from(csv: &str) -> ListModel {
        let dataset = parse_text("menu", csv).unwrap();
        let pattern = compile_pattern(DEFAULT_LEVEL_PATTERN).unwrap();
        let levels = discover_levels(&dataset.headers, &pattern);
        build(&dataset, &levels, &ContentColumns::default())
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn assert_node(node: &CategoryNode, name: &str, parent: Option<&str>, children: &[&str]) {
        assert_eq!(node.name, name);
        assert_eq!(node.parent.as_deref(), parent);
        assert_eq!(node.children, strings(children));
    }

    #[test]
    fn test_categories_and_relationships() {
        let model = build_from(MENU_CSV);
        let c = &model.categories;
        assert_eq!(c.len(), 7);

        assert_eq!(c[0].nodes.len(), 2);
        assert_node(&c[0].nodes[0], "All Settings", None, &["Features"]);
        assert_node(&c[0].nodes[1], "Climate Settings", None, &[]);

        assert_eq!(c[1].nodes.len(), 1);
        assert_node(&c[1].nodes[0], "Features", Some("All Settings"), &["Media"]);

        assert_eq!(c[2].nodes.len(), 1);
        assert_node(&c[2].nodes[0], "Media", Some("Features"), &["DAB", "AM-FM-HD Radio"]);

        assert_eq!(c[3].nodes.len(), 2);
        assert_node(&c[3].nodes[0], "DAB", Some("Media"), &["TBD"]);
        assert_node(&c[3].nodes[1], "AM-FM-HD Radio", Some("Media"), &[]);

        assert_eq!(c[4].nodes.len(), 1);
        assert_node(&c[4].nodes[0], "TBD", Some("DAB"), &[]);

        assert!(c[5].nodes.is_empty());
        assert!(c[6].nodes.is_empty());
    }

    #[test]
    fn test_node_levels_and_source_ids() {
        let model = build_from(MENU_CSV);
        let media = model.categories[2].find("Media").unwrap();
        assert_eq!(media.level, 3);
        assert_eq!(media.source_id.as_deref(), Some("2.02.03.02.01.01"));
        assert_eq!(model.categories[6].column, "L7");
    }

    #[test]
    fn test_content_leaves_anchor_to_deepest_level() {
        let model = build_from(MENU_CSV);
        assert_eq!(model.content.len(), 3);

        let tbd = &model.content[0];
        assert_eq!(tbd.label.as_deref(), Some("TBD"));
        assert_eq!(tbd.control, None);
        assert_eq!(tbd.values.as_deref(), Some("TBD"));
        assert_eq!(tbd.parent_label.as_deref(), Some("TBD"));
        assert_eq!(tbd.parent_level, Some(5));

        let station = &model.content[1];
        assert_eq!(station.label.as_deref(), Some("Station List Order"));
        assert_eq!(station.values.as_deref(), Some("ABC/123"));
        assert_eq!(station.parent_label.as_deref(), Some("AM-FM-HD Radio"));
        assert_eq!(station.parent_level, Some(4));

        let heater = &model.content[2];
        assert_eq!(heater.id.as_deref(), Some("3.02"));
        assert_eq!(heater.label.as_deref(), Some("Auto Front Heater"));
        assert_eq!(heater.control, None);
        assert_eq!(heater.values.as_deref(), Some("On/Off"));
        assert_eq!(heater.parent_label.as_deref(), Some("Climate Settings"));
        assert_eq!(heater.parent_level, Some(1));
    }

    #[test]
    fn test_gap_in_levels_still_anchors_deepest() {
        let model = build_from("L1,L2,L3,Content\nRoot,,Leaf,Item\n");

        assert!(model.categories[1].nodes.is_empty());
        // The L3 cell's preceding column is empty, so no parent.
        assert_node(&model.categories[2].nodes[0], "Leaf", None, &[]);
        // Root has no L2 value on any row.
        assert_node(&model.categories[0].nodes[0], "Root", None, &[]);

        assert_eq!(model.content[0].parent_label.as_deref(), Some("Leaf"));
        assert_eq!(model.content[0].parent_level, Some(3));
    }

    #[test]
    fn test_row_without_levels_has_no_anchor() {
        let model = build_from("L1,L2,Content\n,,Orphan\n");
        assert!(model.categories.iter().all(|c| c.nodes.is_empty()));
        assert_eq!(model.content.len(), 1);
        assert_eq!(model.content[0].label.as_deref(), Some("Orphan"));
        assert_eq!(model.content[0].parent_label, None);
        assert_eq!(model.content[0].parent_level, None);
    }

    #[test]
    fn test_duplicate_rows_keep_every_leaf() {
        let model = build_from("L1,Content\nAudio,Volume\nAudio,Volume\n");
        assert_eq!(model.categories[0].nodes.len(), 1);
        assert_eq!(model.content.len(), 2);
        assert_eq!(model.content[0], model.content[1]);
    }

    #[test]
    fn test_children_aggregate_across_rows() {
        let csv = "L1,L2,L3\n\
            Display,Brightness,Auto\n\
            Audio,Balance,\n\
            Display,Theme,Dark\n\
            Display,Brightness,Manual\n\
            Display,Theme,Dark\n";
        let model = build_from(csv);

        assert_eq!(model.categories[0].names(), vec!["Display", "Audio"]);
        assert_node(&model.categories[0].nodes[0], "Display", None, &["Brightness", "Theme"]);
        assert_node(&model.categories[0].nodes[1], "Audio", None, &["Balance"]);
        assert_node(
            &model.categories[1].nodes[0],
            "Brightness",
            Some("Display"),
            &["Auto", "Manual"],
        );
        assert_eq!(model.categories[2].names(), vec!["Auto", "Dark", "Manual"]);
    }

    #[test]
    fn test_names_unique_per_level_when_parents_differ() {
        let csv = "L1,L2\nAudio,Reset\nDisplay,Reset\n";
        let model = build_from(csv);

        assert_eq!(model.categories[1].nodes.len(), 1);
        assert_node(&model.categories[1].nodes[0], "Reset", Some("Audio"), &[]);
    }

    #[test]
    fn test_levels_follow_header_order() {
        let model = build_from("L2,L1\nChild,Parent\n");
        assert_eq!(model.categories[0].column, "L2");
        assert_node(&model.categories[0].nodes[0], "Child", None, &["Parent"]);
        assert_node(&model.categories[1].nodes[0], "Parent", Some("Child"), &[]);
    }

    #[test]
    fn test_empty_dataset() {
        let model = build_from("ID,L1,L2,L3,Content,Control,Values\n");
        assert_eq!(model.categories.len(), 3);
        assert!(model.categories.iter().all(|c| c.nodes.is_empty()));
        assert!(model.content.is_empty());
    }

    #[test]
    fn test_no_level_columns() {
        let model = build_from("ID,Content\n1,Volume\n");
        assert!(model.categories.is_empty());
        assert_eq!(model.content.len(), 1);
        assert_eq!(model.content[0].parent_level, None);
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(build_from(MENU_CSV), build_from(MENU_CSV));
    }
}
