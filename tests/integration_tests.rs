mod api;
mod unit;
mod websocket;
