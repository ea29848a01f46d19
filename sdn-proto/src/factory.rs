//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! Builders for every wire message type, one per payload schema.

use serde_json::{Value, json};

use crate::message::{Message, MessageType};

const CONTROLLER: &str = "CONTROLLER";

/// A neighbor entry as reported in a `NEIGHBOR_UPDATE` payload.
#[derive(Debug, Clone)]
pub struct NeighborReport {
    pub nombre: String,
    pub ip: String,
    pub costo: f64,
    pub estado: String,
}

/// A route entry as pushed in a `ROUTE_UPDATE` payload.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub destino: String,
    pub next_hop: String,
    pub interfaz_salida: String,
    pub costo: f64,
    pub origen_info: String,
}

pub struct MessageFactory;

impl MessageFactory {
    pub fn register(router_id: i64, router_nombre: &str, router_ip: &str) -> Message {
        Message::new(
            MessageType::Register,
            router_nombre,
            CONTROLLER,
            json!({
                "router_id": router_id,
                "router_nombre": router_nombre,
                "router_ip": router_ip,
            }),
        )
    }

    pub fn register_ack(router_nombre: &str, success: bool, message: &str) -> Message {
        Message::new(
            MessageType::RegisterAck,
            CONTROLLER,
            router_nombre,
            json!({ "success": success, "message": message }),
        )
    }

    pub fn heartbeat(router_nombre: &str) -> Message {
        Message::new(MessageType::Heartbeat, router_nombre, CONTROLLER, json!({}))
    }

    pub fn heartbeat_ack(router_nombre: &str) -> Message {
        Message::new(MessageType::HeartbeatAck, CONTROLLER, router_nombre, json!({}))
    }

    pub fn neighbor_update(router_nombre: &str, vecinos: &[NeighborReport]) -> Message {
        let vecinos: Vec<Value> = vecinos
            .iter()
            .map(|v| {
                json!({
                    "nombre": v.nombre,
                    "ip": v.ip,
                    "costo": v.costo,
                    "estado": v.estado,
                })
            })
            .collect();
        Message::new(
            MessageType::NeighborUpdate,
            router_nombre,
            CONTROLLER,
            json!({ "vecinos": vecinos }),
        )
    }

    pub fn route_update(router_nombre: &str, rutas: &[RouteEntry]) -> Message {
        let rutas: Vec<Value> = rutas
            .iter()
            .map(|r| {
                json!({
                    "destino": r.destino,
                    "next_hop": r.next_hop,
                    "interfaz_salida": r.interfaz_salida,
                    "costo": r.costo,
                    "origen_info": r.origen_info,
                })
            })
            .collect();
        Message::new(
            MessageType::RouteUpdate,
            CONTROLLER,
            router_nombre,
            json!({ "rutas": rutas }),
        )
    }

    pub fn route_request(router_nombre: &str, destino: &str) -> Message {
        Message::new(
            MessageType::RouteRequest,
            router_nombre,
            CONTROLLER,
            json!({ "destino": destino }),
        )
    }

    /// `next_hop` is always sent as `null`, even when a path exists — this
    /// preserves the behavior documented as Open Question 2 in the design
    /// notes (a consumer must tolerate an absent `next_hop`).
    pub fn route_response(
        router_nombre: &str,
        destino: &str,
        costo: Option<f64>,
        camino: Option<&str>,
    ) -> Message {
        Message::new(
            MessageType::RouteResponse,
            CONTROLLER,
            router_nombre,
            json!({
                "ruta": {
                    "destino": destino,
                    "next_hop": Value::Null,
                    "costo": costo,
                    "camino": camino,
                }
            }),
        )
    }

    pub fn error(sender: &str, receiver: &str, error_msg: &str) -> Message {
        Message::new(MessageType::Error, sender, receiver, json!({ "error": error_msg }))
    }

    pub fn disconnect(router_nombre: &str) -> Message {
        Message::new(MessageType::Disconnect, router_nombre, CONTROLLER, json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_payload_uses_router_nombre_key() {
        let msg = MessageFactory::register(1, "R1", "10.0.0.1");
        assert_eq!(msg.payload["router_nombre"], "R1");
        assert_eq!(msg.payload["router_id"], 1);
    }

    #[test]
    fn route_response_next_hop_always_null() {
        let msg = MessageFactory::route_response("R1", "10.0.0.3", Some(2.0), Some("R1->R2->R3"));
        assert!(msg.payload["ruta"]["next_hop"].is_null());
    }
}
