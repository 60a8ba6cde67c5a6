use crate::geometry::*;
use crate::model::*;

/// A queued intent. `on_complete` is handed back to the caller once the order
/// has been written out.
#[derive(Clone, Debug, PartialEq)]
pub struct Command<C> {
    pub order: Order,
    pub on_complete: Option<C>,
}

impl<C> Command<C> {
    pub fn new(order: Order) -> Command<C> {
        Command { order, on_complete: None }
    }

    pub fn with_completion(order: Order, on_complete: C) -> Command<C> {
        Command {
            order,
            on_complete: Some(on_complete),
        }
    }

    pub fn action(&self) -> ActionKind {
        self.order.action
    }
}

/// Anything commands can be pushed onto. Provides the order vocabulary.
pub trait CommandSink<C> {
    fn push_command(&mut self, command: Command<C>);

    fn push(&mut self, order: Order) {
        self.push_command(Command::new(order));
    }

    fn push_then(&mut self, order: Order, on_complete: C) {
        self.push_command(Command::with_completion(order, on_complete));
    }

    fn select(&mut self, frame: Rect, vehicle_type: Option<UnitType>) {
        self.push(selection(ActionKind::ClearAndSelect, frame, vehicle_type));
    }

    fn add_to_selection(&mut self, frame: Rect, vehicle_type: Option<UnitType>) {
        self.push(selection(ActionKind::AddToSelection, frame, vehicle_type));
    }

    fn select_group(&mut self, group: GroupId) {
        self.push(Order {
            action: ActionKind::ClearAndSelect,
            group: Some(group),
            ..Default::default()
        });
    }

    fn assign(&mut self, group: GroupId) {
        self.push(Order {
            action: ActionKind::Assign,
            group: Some(group),
            ..Default::default()
        });
    }

    fn dismiss(&mut self, group: GroupId) {
        self.push(Order {
            action: ActionKind::Dismiss,
            group: Some(group),
            ..Default::default()
        });
    }

    fn disband(&mut self, group: GroupId) {
        self.push(Order {
            action: ActionKind::Disband,
            group: Some(group),
            ..Default::default()
        });
    }

    fn move_by(&mut self, delta: Point, max_speed: Option<f64>) {
        self.push(Order {
            action: ActionKind::Move,
            x: Some(delta.x),
            y: Some(delta.y),
            max_speed,
            ..Default::default()
        });
    }

    fn stop_movement(&mut self) {
        self.move_by(Point::new(0.0, 0.0), None);
    }

    fn scale(&mut self, center: Point, factor: f64) {
        self.push(scale_order(center, factor));
    }

    fn rotate(&mut self, center: Point, angle_degrees: f64) {
        self.push(Order {
            action: ActionKind::Rotate,
            x: Some(center.x),
            y: Some(center.y),
            angle: Some(angle_degrees.to_radians()),
            ..Default::default()
        });
    }

    fn setup_vehicle_production(&mut self, facility: FacilityId, vehicle_type: UnitType) {
        self.push(Order {
            action: ActionKind::SetupVehicleProduction,
            facility_id: Some(facility),
            vehicle_type: Some(vehicle_type),
            ..Default::default()
        });
    }

    fn tactical_nuke(&mut self, target: Point, highlighter: UnitId) {
        self.push(Order {
            action: ActionKind::TacticalNuclearStrike,
            x: Some(target.x),
            y: Some(target.y),
            vehicle_id: Some(highlighter),
            ..Default::default()
        });
    }
}

pub fn scale_order(center: Point, factor: f64) -> Order {
    Order {
        action: ActionKind::Scale,
        x: Some(center.x),
        y: Some(center.y),
        factor: Some(factor),
        ..Default::default()
    }
}

fn selection(action: ActionKind, frame: Rect, vehicle_type: Option<UnitType>) -> Order {
    Order {
        action,
        left: Some(frame.left),
        top: Some(frame.top),
        right: Some(frame.right),
        bottom: Some(frame.bottom),
        vehicle_type,
        ..Default::default()
    }
}

/// Ordered scratch list used to build a priority block.
pub struct CommandBuffer<C> {
    commands: Vec<Command<C>>,
}

impl<C> Default for CommandBuffer<C> {
    fn default() -> CommandBuffer<C> {
        CommandBuffer { commands: Vec::new() }
    }
}

impl<C> CommandBuffer<C> {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn into_commands(self) -> Vec<Command<C>> {
        self.commands
    }
}

impl<C> CommandSink<C> for CommandBuffer<C> {
    fn push_command(&mut self, command: Command<C>) {
        self.commands.push(command);
    }
}
