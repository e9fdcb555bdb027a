use super::*;

/// Lays out every person of `tree` as a lifespan bar on a shared date axis.
///
/// Rows are filled depth-first from each patriarch: the latest child of the
/// latest partner first, then further partners, until the pool of unplaced
/// persons is exhausted.
pub fn compute_tree_layout<R: Rng>(
    tree: &GrampsTree,
    theme: &Theme,
    config: &LayoutConfig,
    rng: &mut R,
) -> Result<Layout, TreeError> {
    let timeline = &config.timeline;
    let today = timeline.today();
    let origin = tree
        .persons()
        .values()
        .map(|person| person.birth.date)
        .min()
        .unwrap_or(today);

    let mut placer = RowPlacer {
        tree,
        theme,
        config: timeline,
        scale: DateScale::new(origin, timeline),
        today,
        rng,
        pool: UnplacedPool::new(tree),
        row: -1,
        nodes: Vec::new(),
        person_objects: Vec::new(),
    };

    loop {
        placer.row += 1;
        let Some(patriarch) = find_patriarch(&placer.pool) else {
            break;
        };
        placer.place_row_sequence(patriarch)?;
    }

    let family_lines = placer.family_lines()?;
    let background = if tree.is_empty() {
        Vec::new()
    } else {
        placer.era_markers()
    };

    let days = (today - origin).num_days().max(0);
    let width = days as f32 * timeline.x_scale + timeline.x_offset * 10.0;
    let height = timeline.row_pitch() * (placer.row + 2) as f32;

    let mut primitives = background;
    primitives.extend(family_lines);
    primitives.append(&mut placer.person_objects);

    Ok(Layout {
        kind: DiagramKind::FullTree,
        focus: None,
        width,
        height,
        nodes: placer.nodes,
        primitives,
    })
}

struct RowPlacer<'a, R> {
    tree: &'a GrampsTree,
    theme: &'a Theme,
    config: &'a TimelineConfig,
    scale: DateScale,
    today: NaiveDate,
    rng: &'a mut R,
    pool: UnplacedPool<'a>,
    /// Last used row; starts at -1 and is advanced once per row sequence and
    /// once per placed person.
    row: i32,
    nodes: Vec<PlacedNode>,
    person_objects: Vec<Primitive>,
}

impl<'a, R: Rng> RowPlacer<'a, R> {
    /// Places `seed` and everyone reachable from it through `next_person`.
    fn place_row_sequence(&mut self, seed: &'a Person) -> Result<(), TreeError> {
        self.place(seed)?;
        let mut stack = vec![seed];
        while let Some(&current) = stack.last() {
            match next_person(current, &self.pool) {
                Some(next) => {
                    self.place(next)?;
                    stack.push(next);
                }
                None => {
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    fn place(&mut self, person: &'a Person) -> Result<(), TreeError> {
        self.row += 1;
        let cfg = self.config;
        let height = cfg.row_height;
        let y = cfg.row_pitch() * self.row as f32;
        let x = self.scale.x(person.birth.date);
        let width = self.scale.span(person.days_of_life());
        let color = self.theme.gender_color(person.gender);
        let fade = self.theme.fade_color.as_str();

        self.person_objects.push(Primitive::Rect(RectPrimitive {
            x,
            y,
            width,
            height,
            fill: Paint::Color(color.to_string()),
        }));

        if person.birth.is_estimated() {
            let offset = self.scale.span_years(cfg.birth_uncertainty_years);
            self.person_objects.push(Primitive::Rect(RectPrimitive {
                x: x - offset,
                y,
                width: offset,
                height,
                fill: Paint::Gradient(fade_in(x - offset, x, y, height, color, fade)),
            }));
        }

        if person.death.is_estimated() {
            let offset = self.scale.span_years(cfg.death_uncertainty_years);
            let start = x + width;
            self.person_objects.push(Primitive::Rect(RectPrimitive {
                x: start,
                y,
                width: offset,
                height,
                fill: Paint::Gradient(fade_out(start, start + offset, y, height, color, fade)),
            }));
        }

        let label_y = y + cfg.font_size;
        self.person_objects.push(Primitive::Text(TextPrimitive {
            x,
            y: label_y,
            text: person.label(self.today, &cfg.present_label),
            font_size: cfg.font_size,
            hidden: false,
        }));
        self.person_objects.push(Primitive::Text(TextPrimitive {
            x,
            y: label_y,
            text: person.id.to_string(),
            font_size: cfg.font_size,
            hidden: true,
        }));

        self.pool.place(&person.id);
        info!(id = %person.id, name = %person.full_name, row = self.row, "person added");

        if let Some(family) = self.tree.parental_family(&person.id) {
            let wedding = family.wedding_day(self.tree.persons(), self.rng)?;
            let mid = y + height / 2.0;
            self.person_objects.push(segment(
                (x, mid),
                (self.scale.x(wedding), mid),
                &self.theme.marriage_line_color,
                cfg.line_width,
            ));
        }

        self.nodes.push(PlacedNode {
            id: person.id.clone(),
            x,
            y,
            width,
            height,
            placement: Placement::Row(self.row as usize),
        });
        Ok(())
    }

    /// Vertical connector at the wedding-day x of every family with children
    /// or two parents, with triangles at the parents' rows.
    fn family_lines(&mut self) -> Result<Vec<Primitive>, TreeError> {
        let cfg = self.config;
        let half = cfg.row_height / 2.0;
        let stroke = self.theme.marriage_line_color.as_str();
        let row_y: HashMap<&GrampsId, f32> =
            self.nodes.iter().map(|node| (&node.id, node.y)).collect();

        let mut lines = Vec::new();
        for family in self.tree.families().values() {
            if family.children.is_empty() && !family.is_full() {
                continue;
            }

            let mut members = Vec::new();
            for id in family.children.iter().chain(family.parents()) {
                let y = row_y
                    .get(id)
                    .copied()
                    .ok_or_else(|| TreeError::UnknownPerson { id: id.clone() })?;
                members.push((id, y));
            }
            let Some(&(top_id, _)) = members.iter().max_by(|a, b| a.1.total_cmp(&b.1)) else {
                continue;
            };
            let Some(&(lower_id, _)) = members.iter().min_by(|a, b| a.1.total_cmp(&b.1)) else {
                continue;
            };

            let x = self
                .scale
                .x(family.wedding_day(self.tree.persons(), self.rng)?);
            let mut top_y = None;
            let mut lower_y = None;
            for &(id, y) in &members {
                if family.has_parent(id) {
                    if id == top_id {
                        top_y = Some(y);
                        lines.push(marker_triangle(x, y, MarkerDirection::Down, cfg, stroke));
                    } else if id == lower_id {
                        let bottom = y + cfg.row_height;
                        lower_y = Some(bottom);
                        lines.push(marker_triangle(x, bottom, MarkerDirection::Up, cfg, stroke));
                    } else {
                        lines.push(marker_triangle(x, y, MarkerDirection::Down, cfg, stroke));
                        lines.push(marker_triangle(
                            x,
                            y + cfg.row_height,
                            MarkerDirection::Up,
                            cfg,
                            stroke,
                        ));
                    }
                } else if id == top_id {
                    top_y = Some(y + half);
                } else if id == lower_id {
                    lower_y = Some(y + half);
                }
            }

            if let (Some(lower), Some(top)) = (lower_y, top_y) {
                lines.push(segment((x, lower), (x, top), stroke, cfg.line_width));
            } else {
                debug!(family = %family.id, "family spans a single row, no connector");
            }
        }
        Ok(lines)
    }

    /// Vertical ticks with labels at the configured historical dates.
    fn era_markers(&self) -> Vec<Primitive> {
        let cfg = self.config;
        let stroke = self.theme.era_line_color.as_str();
        let dash = cfg.dash_width / 2.0;
        let y_min = cfg.row_height;
        let y_max = cfg.row_pitch() * self.row as f32;
        let label_y = y_max + cfg.row_height;

        let mut objects = Vec::new();
        for marker in &cfg.era_markers {
            let x = self.scale.x(marker.date);
            objects.push(polyline(
                vec![
                    (x - dash, y_min),
                    (x + dash, y_min),
                    (x, y_min),
                    (x, y_max),
                    (x + dash, y_max),
                    (x - dash, y_max),
                ],
                stroke,
                cfg.line_width,
            ));

            let label = match &marker.label {
                EraLabel::Year => Some((marker.date.year().to_string(), x - cfg.font_size)),
                EraLabel::Text(text) => {
                    let width = approx_text_width(text, cfg.font_size, cfg.era_label_char_width);
                    Some((text.clone(), x - width / 2.0))
                }
                EraLabel::Hidden => None,
            };
            if let Some((text, x)) = label {
                objects.push(Primitive::Text(TextPrimitive {
                    x,
                    y: label_y,
                    text,
                    font_size: cfg.font_size,
                    hidden: false,
                }));
            }
        }
        objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Date, Family, Gender};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeMap;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn person(id: &str, gender: Gender, birth: Date, death: Option<Date>) -> Person {
        Person::new(id, format!("Person {id}"), Some(birth), death, gender).unwrap()
    }

    fn config() -> LayoutConfig {
        let mut config = LayoutConfig::default();
        config.timeline.today = Some(ymd(2024, 1, 1));
        config
    }

    /// A (m, 1950) and B (f, 1952) with one child C (1975).
    fn small_family() -> GrampsTree {
        let persons = [
            person("A", Gender::Male, Date::exact(ymd(1950, 3, 1)), Some(Date::exact(ymd(2010, 3, 1)))),
            person("B", Gender::Female, Date::exact(ymd(1952, 5, 1)), Some(Date::exact(ymd(2015, 5, 1)))),
            person("C", Gender::Male, Date::exact(ymd(1975, 7, 1)), Some(Date::exact(ymd(2020, 7, 1)))),
        ];
        let persons: BTreeMap<_, _> = persons.into_iter().map(|p| (p.id.clone(), p)).collect();
        let family = Family::new("F1").with_father("A").with_mother("B").with_child("C");
        let families = BTreeMap::from([(family.id.clone(), family)]);
        GrampsTree::with_derived_relations(persons, families).unwrap()
    }

    #[test]
    fn small_family_gets_three_rows_and_a_connector() {
        let tree = small_family();
        let config = config();
        let mut rng = StdRng::seed_from_u64(7);
        let layout = compute_tree_layout(&tree, &Theme::default(), &config, &mut rng).unwrap();

        let order: Vec<_> = layout.nodes.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(order, vec!["A", "C", "B"]);
        let rows: Vec<_> = layout.nodes.iter().map(|node| node.placement).collect();
        assert_eq!(rows, vec![Placement::Row(1), Placement::Row(2), Placement::Row(3)]);

        let wedding = tree.families()[&GrampsId::from("F1")]
            .wedding_day(tree.persons(), &mut rng)
            .unwrap();
        assert!(wedding <= ymd(1975, 7, 1) - chrono::TimeDelta::weeks(40));
        assert!(wedding > ymd(1975, 7, 1) - chrono::TimeDelta::weeks(540));

        let scale = DateScale::new(ymd(1950, 3, 1), &config.timeline);
        let wedding_x = scale.x(wedding);
        let vertical = layout
            .polylines()
            .filter(|line| line.points.len() == 2)
            .find(|line| line.points[0].0 == wedding_x && line.points[1].0 == wedding_x)
            .expect("family connector");
        let pitch = config.timeline.row_pitch();
        let a_row = layout.node(&GrampsId::from("A")).unwrap().y;
        let b_row = layout.node(&GrampsId::from("B")).unwrap().y;
        assert_eq!(a_row, pitch);
        assert_eq!(vertical.points[0].1, a_row + config.timeline.row_height);
        assert_eq!(vertical.points[1].1, b_row);

        assert_eq!(layout.height, pitch * 6.0);
        assert!(layout.width > 0.0);
    }

    #[test]
    fn child_connects_to_its_parents_wedding() {
        let tree = small_family();
        let config = config();
        let mut rng = StdRng::seed_from_u64(1);
        let layout = compute_tree_layout(&tree, &Theme::default(), &config, &mut rng).unwrap();
        let child = layout.node(&GrampsId::from("C")).unwrap();
        let mid = child.y + config.timeline.row_height / 2.0;
        let connector = layout
            .polylines()
            .find(|line| line.points.len() == 2 && line.points[0] == (child.x, mid))
            .expect("parental connector");
        assert!(connector.points[1].0 < child.x);
    }

    #[test]
    fn estimated_dates_fade_out_of_the_bar() {
        let persons = [person("A", Gender::Female, Date::estimated(ymd(1950, 1, 1)), None)];
        let persons: BTreeMap<_, _> = persons.into_iter().map(|p| (p.id.clone(), p)).collect();
        let tree = GrampsTree::with_derived_relations(persons, BTreeMap::new()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let layout = compute_tree_layout(&tree, &Theme::default(), &config(), &mut rng).unwrap();

        let gradients: Vec<_> = layout
            .rects()
            .filter_map(|rect| match &rect.fill {
                Paint::Gradient(gradient) => Some((rect, gradient)),
                Paint::Color(_) => None,
            })
            .collect();
        assert_eq!(gradients.len(), 2);
        let (birth, fade_in) = gradients[0];
        assert!((birth.width - 18.25).abs() < 1e-3);
        assert_eq!(fade_in.stops[0].opacity, 0.0);
        let (death, fade_out) = gradients[1];
        assert!((death.width - 36.5).abs() < 1e-3);
        assert_eq!(fade_out.stops[1].opacity, 0.0);

        let labels: Vec<_> = layout.texts().filter(|text| !text.hidden).map(|t| t.text.as_str()).collect();
        assert!(labels.contains(&"Person A (1950-н. в.)"));
    }

    #[test]
    fn era_markers_span_all_rows() {
        let tree = small_family();
        let config = config();
        let mut rng = StdRng::seed_from_u64(3);
        let layout = compute_tree_layout(&tree, &Theme::default(), &config, &mut rng).unwrap();
        let ticks: Vec<_> = layout.polylines().filter(|line| line.points.len() == 6).collect();
        assert_eq!(ticks.len(), config.timeline.era_markers.len());
        let y_max = config.timeline.row_pitch() * 4.0;
        assert!(ticks.iter().all(|tick| tick.points[3].1 == y_max));
        let labels: Vec<_> = layout.texts().map(|text| text.text.as_str()).collect();
        assert!(labels.contains(&"ВОВ"));
        assert!(labels.contains(&"1900"));
    }

    #[test]
    fn empty_tree_yields_blank_canvas() {
        let tree = GrampsTree::default();
        let mut rng = StdRng::seed_from_u64(0);
        let layout = compute_tree_layout(&tree, &Theme::default(), &config(), &mut rng).unwrap();
        assert!(layout.nodes.is_empty());
        assert!(layout.primitives.is_empty());
    }

    #[test]
    fn births_after_today_keep_canvas_width_positive() {
        let tree = small_family();
        let mut config = config();
        config.timeline.today = Some(ymd(1900, 1, 1));
        let mut rng = StdRng::seed_from_u64(3);
        let layout = compute_tree_layout(&tree, &Theme::default(), &config, &mut rng).unwrap();
        assert_eq!(layout.width, config.timeline.x_offset * 10.0);
        assert_eq!(layout.nodes.len(), 3);
    }
}
