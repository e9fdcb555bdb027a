use super::*;

/// One partnership of the focal person: the other parent slot and the
/// family's children, oldest first.
#[derive(Debug)]
struct Lane<'a> {
    partner: Option<&'a Person>,
    children: Vec<&'a Person>,
}

/// Where a descent line starts.
#[derive(Debug, Clone, Copy)]
enum ParentAnchor {
    /// Middle of the gap left of the right-hand parent of a couple.
    Couple { right: usize },
    /// Horizontal center of a lone parent.
    Single { column: usize },
}

/// Lays out the focal person with their parents above and every partner
/// lane beside them, children one generation below.
///
/// Returns [`EgoOutcome::NoRelations`] when the person has neither parents
/// nor families of their own.
pub fn compute_ego_layout(
    focus: &GrampsId,
    tree: &GrampsTree,
    theme: &Theme,
    config: &LayoutConfig,
) -> Result<EgoOutcome, TreeError> {
    let person = tree.person(focus)?;
    let (lanes, mut parents) = collect_relations(person, tree)?;
    if lanes.is_empty() && parents.is_empty() {
        info!(id = %person.id, "no relations to draw");
        return Ok(EgoOutcome::NoRelations);
    }
    debug!(
        id = %person.id,
        parents = parents.len(),
        lanes = lanes.len(),
        "ego relations collected"
    );

    let mut grid = EgoGrid::new(theme, &config.ego);
    let mut generation = 0;

    if parents.len() > 2 {
        warn!(
            id = %person.id,
            count = parents.len(),
            "more than two parents, drawing the first two"
        );
        parents.truncate(2);
    }
    match parents.as_mut_slice() {
        [] => {}
        [parent] => {
            grid.add_person(parent, 0, 0);
            generation = 1;
            grid.descent_line(ParentAnchor::Single { column: 0 }, 0, generation, 0, 0.5);
        }
        pair => {
            pair.sort_by_key(|parent| parent.gender);
            for (column, parent) in pair.iter().enumerate() {
                grid.add_person(parent, 0, column);
            }
            grid.marriage_line(0, 0, 1, 0.5);
            generation = 1;
            grid.descent_line(ParentAnchor::Couple { right: 1 }, 0, generation, 0, 0.5);
        }
    }

    grid.add_person(person, generation, 0);

    let base = family_jitter(lanes.len());
    let mut children_column = 0;
    let mut last_partner_column = 0;
    for (index, lane) in lanes.iter().enumerate() {
        let jitter = 1.0 - base * (index + 1) as f32;
        let anchor = match lane.partner {
            Some(partner) => {
                let column = children_column.max(last_partner_column + 1);
                grid.add_person(partner, generation, column);
                grid.marriage_line(generation, 0, column, jitter);
                last_partner_column = column;
                ParentAnchor::Couple { right: column }
            }
            None => ParentAnchor::Single { column: 0 },
        };
        for child in &lane.children {
            grid.add_person(child, generation + 1, children_column);
            grid.descent_line(anchor, generation, generation + 1, children_column, jitter);
            children_column += 1;
        }
    }

    Ok(EgoOutcome::Drawn(grid.finish(person.id.clone())))
}

fn collect_relations<'a>(
    person: &Person,
    tree: &'a GrampsTree,
) -> Result<(Vec<Lane<'a>>, Vec<&'a Person>), TreeError> {
    let mut lanes = Vec::new();
    let mut parents = Vec::new();
    for family in tree.families().values() {
        if family.has_parent(&person.id) {
            let other = if family.father.as_ref() == Some(&person.id) {
                family.mother.as_ref()
            } else {
                family.father.as_ref()
            };
            let partner = other.map(|id| tree.person(id)).transpose()?;
            let mut children = family
                .children
                .iter()
                .map(|id| tree.person(id))
                .collect::<Result<Vec<_>, _>>()?;
            children.sort_by(|a, b| a.birth.date.cmp(&b.birth.date).then_with(|| a.id.cmp(&b.id)));
            lanes.push(Lane { partner, children });
        }
        if family.has_child(&person.id) {
            for id in family.parents() {
                parents.push(tree.person(id)?);
            }
        }
    }
    Ok((lanes, parents))
}

/// Height fraction between marriage lines of a person with `lanes` families.
fn family_jitter(lanes: usize) -> f32 {
    if lanes == 1 {
        return 0.5;
    }
    let base = 1.0 / (lanes + 1) as f32;
    (base * 100.0).round() / 100.0
}

struct EgoGrid<'a> {
    theme: &'a Theme,
    config: &'a EgoConfig,
    nodes: Vec<PlacedNode>,
    primitives: Vec<Primitive>,
    max_generation: usize,
    max_column: usize,
}

impl<'a> EgoGrid<'a> {
    fn new(theme: &'a Theme, config: &'a EgoConfig) -> Self {
        Self {
            theme,
            config,
            nodes: Vec::new(),
            primitives: Vec::new(),
            max_generation: 0,
            max_column: 0,
        }
    }

    fn add_person(&mut self, person: &Person, generation: usize, column: usize) {
        let cfg = self.config;
        let x = column as f32 * cfg.column_pitch();
        let y = generation as f32 * cfg.generation_pitch();

        self.primitives.push(Primitive::Rect(RectPrimitive {
            x,
            y,
            width: cfg.person_width,
            height: cfg.person_height,
            fill: Paint::Color(self.theme.gender_color(person.gender).to_string()),
        }));

        let label_width = approx_text_width(&person.full_name, cfg.font_size, cfg.label_char_width);
        let label_x = x + cfg.person_width / 2.0 - label_width / 2.0;
        let label_y = y + cfg.person_height / 2.0;
        self.primitives.push(Primitive::Text(TextPrimitive {
            x: label_x,
            y: label_y,
            text: person.full_name.clone(),
            font_size: cfg.font_size,
            hidden: false,
        }));
        self.primitives.push(Primitive::Text(TextPrimitive {
            x: label_x,
            y: label_y,
            text: person.id.to_string(),
            font_size: cfg.font_size,
            hidden: true,
        }));

        self.nodes.push(PlacedNode {
            id: person.id.clone(),
            x,
            y,
            width: cfg.person_width,
            height: cfg.person_height,
            placement: Placement::Cell { generation, column },
        });
        self.max_generation = self.max_generation.max(generation);
        self.max_column = self.max_column.max(column);
        info!(id = %person.id, generation, column, "person added");
    }

    fn marriage_line(&mut self, generation: usize, left: usize, right: usize, jitter: f32) {
        let cfg = self.config;
        let y = generation as f32 * cfg.generation_pitch() + cfg.person_height * jitter;
        self.primitives.push(segment(
            (left as f32 * cfg.column_pitch() + cfg.person_width, y),
            (right as f32 * cfg.column_pitch(), y),
            &self.theme.marriage_line_color,
            cfg.line_width,
        ));
    }

    fn descent_line(
        &mut self,
        anchor: ParentAnchor,
        up: usize,
        down: usize,
        child_column: usize,
        jitter: f32,
    ) {
        let cfg = self.config;
        let x_up = match anchor {
            ParentAnchor::Couple { right } => right as f32 * cfg.column_pitch() - cfg.x_spacing / 2.0,
            ParentAnchor::Single { column } => column as f32 * cfg.column_pitch() + cfg.person_width / 2.0,
        };
        let y_up = up as f32 * cfg.generation_pitch() + cfg.person_height * jitter;
        let x_down = child_column as f32 * cfg.column_pitch() + cfg.person_width * jitter;
        let y_down = down as f32 * cfg.generation_pitch();
        self.primitives.push(segment(
            (x_up, y_up),
            (x_down, y_down),
            &self.theme.descent_line_color,
            cfg.line_width,
        ));
    }

    fn finish(mut self, focus: GrampsId) -> Layout {
        // Lines under boxes, labels last; emission order is kept per layer.
        self.primitives.sort_by_key(Primitive::layer);
        Layout {
            kind: DiagramKind::Ego,
            focus: Some(focus),
            width: (self.max_column + 1) as f32 * self.config.column_pitch(),
            height: (self.max_generation + 1) as f32 * self.config.generation_pitch(),
            nodes: self.nodes,
            primitives: self.primitives,
        }
    }
}
