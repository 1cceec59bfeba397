// JSON view of the world for tooling and logs.
// The binary codec remains the transport format; these DTOs are for humans and scripts.

use crate::domain::{Impulse, ImpulseChain, Object, ObjectType, Vector, World};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorDto {
    pub x: f64,
    pub y: f64,
}

impl From<Vector> for VectorDto {
    fn from(v: Vector) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<VectorDto> for Vector {
    fn from(v: VectorDto) -> Self {
        Vector::new(v.x, v.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectTypeDto {
    Other,
    Creature,
    Projectile,
    Effect,
    Terrain,
    Structure,
    Item,
}

impl From<ObjectType> for ObjectTypeDto {
    fn from(kind: ObjectType) -> Self {
        match kind {
            ObjectType::Other => Self::Other,
            ObjectType::Creature => Self::Creature,
            ObjectType::Projectile => Self::Projectile,
            ObjectType::Effect => Self::Effect,
            ObjectType::Terrain => Self::Terrain,
            ObjectType::Structure => Self::Structure,
            ObjectType::Item => Self::Item,
        }
    }
}

impl From<ObjectTypeDto> for ObjectType {
    fn from(kind: ObjectTypeDto) -> Self {
        match kind {
            ObjectTypeDto::Other => Self::Other,
            ObjectTypeDto::Creature => Self::Creature,
            ObjectTypeDto::Projectile => Self::Projectile,
            ObjectTypeDto::Effect => Self::Effect,
            ObjectTypeDto::Terrain => Self::Terrain,
            ObjectTypeDto::Structure => Self::Structure,
            ObjectTypeDto::Item => Self::Item,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpulseDto {
    pub direction: VectorDto,
    pub damping: f64,
}

/// Object state with its impulse chain flattened head-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDto {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: ObjectTypeDto,
    #[serde(default)]
    pub client_created: bool,
    pub size: VectorDto,
    #[serde(default)]
    pub velocity: VectorDto,
    pub position: VectorDto,
    #[serde(default)]
    pub anchor: VectorDto,
    pub gravity_factor: f64,
    #[serde(default)]
    pub impulses: Vec<ImpulseDto>,
}

impl From<&Object> for ObjectDto {
    fn from(object: &Object) -> Self {
        Self {
            id: object.id,
            kind: object.kind.into(),
            client_created: object.client_created,
            size: object.size.into(),
            velocity: object.velocity.into(),
            position: object.position.into(),
            anchor: object.anchor.into(),
            gravity_factor: object.gravity_factor,
            impulses: object
                .impulses
                .iter()
                .map(|impulse| ImpulseDto {
                    direction: impulse.direction.into(),
                    damping: impulse.damping,
                })
                .collect(),
        }
    }
}

impl From<ObjectDto> for Object {
    fn from(dto: ObjectDto) -> Self {
        let impulses: ImpulseChain = dto
            .impulses
            .into_iter()
            .map(|impulse| Impulse::new(impulse.direction.into(), impulse.damping))
            .collect();
        Object {
            id: dto.id,
            kind: dto.kind.into(),
            client_created: dto.client_created,
            size: dto.size.into(),
            velocity: dto.velocity.into(),
            position: dto.position.into(),
            anchor: dto.anchor.into(),
            gravity_factor: dto.gravity_factor,
            impulses,
        }
    }
}

/// Whole-world view; objects are sorted by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldDto {
    pub gravity: f64,
    pub boundary: VectorDto,
    #[serde(default)]
    pub objects: Vec<ObjectDto>,
}

impl From<&World> for WorldDto {
    fn from(world: &World) -> Self {
        let mut objects: Vec<ObjectDto> = world.objects().map(ObjectDto::from).collect();
        objects.sort_unstable_by_key(|object| object.id);
        Self {
            gravity: world.gravity,
            boundary: world.boundary.into(),
            objects,
        }
    }
}

impl From<WorldDto> for World {
    fn from(dto: WorldDto) -> Self {
        World::new(dto.gravity, dto.boundary.into())
            .with_objects(dto.objects.into_iter().map(Object::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn when_world_is_serialized_then_objects_are_sorted_and_chains_flattened() {
        let chain: ImpulseChain = [
            Impulse::new(Vector::new(1.0, 0.0), 0.9),
            Impulse::new(Vector::new(0.0, 2.0), 0.5),
        ]
        .into_iter()
        .collect();
        let world = World::new(9.8, Vector::new(100.0, 50.0)).with_objects([
            Object::new(5, ObjectType::Item),
            Object::new(2, ObjectType::Creature).with_impulses(chain),
        ]);

        let value = serde_json::to_value(WorldDto::from(&world)).expect("serialize world");

        assert_eq!(value["objects"][0]["id"], json!(2));
        assert_eq!(value["objects"][0]["type"], json!("creature"));
        assert_eq!(value["objects"][0]["impulses"][1]["damping"], json!(0.5));
        assert_eq!(value["objects"][1]["type"], json!("item"));
    }

    #[test]
    fn when_json_omits_optional_fields_then_defaults_apply() {
        let payload = json!({
            "gravity": 9.8,
            "boundary": { "x": 100.0, "y": 100.0 },
            "objects": [{
                "id": -1,
                "type": "effect",
                "size": { "x": 1.0, "y": 1.0 },
                "position": { "x": 10.0, "y": 20.0 },
                "gravity_factor": 0.5
            }]
        });

        let dto: WorldDto = serde_json::from_value(payload).expect("deserialize world");
        let world = World::from(dto);

        let object = world.object(-1).expect("object should exist");
        assert_eq!(object.kind, ObjectType::Effect);
        assert!(!object.client_created);
        assert_eq!(object.velocity, Vector::ZERO);
        assert!(object.impulses.is_empty());
    }

    #[test]
    fn when_world_goes_through_json_then_it_is_unchanged() {
        let world = World::new(1.5, Vector::new(10.0, 10.0)).with_objects([Object::new(
            1,
            ObjectType::Projectile,
        )
        .with_impulses(std::iter::once(Impulse::new(Vector::new(3.0, 4.0), 0.75)).collect())]);

        let text = serde_json::to_string(&WorldDto::from(&world)).expect("serialize");
        let back: WorldDto = serde_json::from_str(&text).expect("deserialize");

        assert_eq!(World::from(back), world);
    }
}
